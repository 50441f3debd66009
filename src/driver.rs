use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use neural_classifier::{
    CheckpointStore, Config, Dataset, Network, Trainer,
    dataset::{features_of, read_image, render},
};

use crate::cli::RunRequest;

/// What a run did, besides printing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Epochs trained in this run.
    pub epochs_trained: usize,
    pub accuracy: Option<f32>,
    /// Predicted class of the test sample.
    pub sample_class: Option<usize>,
    /// Predicted class of the image.
    pub predicted_class: Option<usize>,
}

/// Carries out every mode the request asks for: train, then test, then predict.
pub fn run(request: &RunRequest) -> Result<RunSummary> {
    let config = request
        .config
        .as_ref()
        .map(|path| {
            Config::from_path(path).with_context(|| format!("reading config {}", path.display()))
        })
        .transpose()?;

    let store = CheckpointStore::new(&request.checkpoint);
    let test_set = request
        .test
        .as_ref()
        .map(|path| read_dataset(path, request))
        .transpose()?;

    let mut summary = RunSummary::default();
    let mut trained = None;
    if let Some(path) = &request.train {
        let train_set = read_dataset(path, request)?;
        let (network, epochs) =
            train(request, config.as_ref(), &store, &train_set, test_set.as_ref())?;

        summary.epochs_trained = epochs;
        trained = Some(network);
    }

    if test_set.is_none() && request.predict.is_none() {
        return Ok(summary);
    }

    let network = match trained {
        Some(network) => network,
        None => load_network(config.as_ref(), &store)?,
    };

    if let Some(test_set) = &test_set {
        let (accuracy, class) = test(&network, test_set, request.sample)?;
        summary.accuracy = Some(accuracy);
        summary.sample_class = class;
    }

    if let Some(path) = &request.predict {
        summary.predicted_class = Some(predict(&network, path)?);
    }

    Ok(summary)
}

fn read_dataset(path: &Path, request: &RunRequest) -> Result<Dataset> {
    let dataset = Dataset::from_csv(path, request.label_column)
        .with_context(|| format!("reading dataset {}", path.display()))?;

    Ok(if request.scale {
        dataset.scaled()
    } else {
        dataset
    })
}

/// Resumes the checkpointed network when asked to and there is one, otherwise starts anew.
fn prepare_network(
    request: &RunRequest,
    config: Option<&Config>,
    store: &CheckpointStore,
) -> Result<Network> {
    let resume = request.resume || config.is_some_and(|c| c.hyperparameters.resume);

    if resume && store.exists() {
        info!("resuming from {}", store.manifest_path().display());
        let network = load_network(config, store)?;
        let hyperparameters = network.hyperparameters().with_resume(true);
        return Ok(network.with_hyperparameters(hyperparameters)?);
    }

    let config = config.context("a --config is required to train a new network")?;
    let hyperparameters = config.hyperparameters.with_resume(resume);
    let network = Network::new(config.architecture.clone(), hyperparameters)?;

    info!("initialized network {}", network.architecture());
    Ok(network)
}

fn train(
    request: &RunRequest,
    config: Option<&Config>,
    store: &CheckpointStore,
    train_set: &Dataset,
    test_set: Option<&Dataset>,
) -> Result<(Network, usize)> {
    let labels = train_set.labels().context("the training set has no labels")?;
    let mut network = prepare_network(request, config, store)?;

    if network.epochs_remaining() == 0 {
        println!(
            "checkpoint {} already completed {} of {} epochs, raise \"epochs\" in a --config to train further",
            store.manifest_path().display(),
            network.epochs_completed(),
            network.hyperparameters().epochs
        );
        return Ok((network, 0));
    }

    let mut trainer = Trainer::new().with_store(store.clone());
    if let Some(test_set) = test_set
        && let Some(test_labels) = test_set.labels()
    {
        trainer = trainer.with_validation(test_set.features(), test_labels);
    }

    let reports = trainer
        .train(&mut network, train_set.features(), labels)
        .context("training")?;

    if let Some(last) = reports.last() {
        println!("trained {} epochs, last loss {:.6}", reports.len(), last.loss);
    }

    Ok((network, reports.len()))
}

/// Loads the checkpointed network, with the configured architecture and hyperparameters if
/// there is a config.
fn load_network(config: Option<&Config>, store: &CheckpointStore) -> Result<Network> {
    let path = store.manifest_path().display();

    let network = match config {
        Some(config) => store
            .load_network(&config.architecture)
            .and_then(|network| network.with_hyperparameters(config.hyperparameters)),
        None => store.load().and_then(|checkpoint| checkpoint.into_stored_network()),
    };

    network.with_context(|| format!("loading checkpoint {path}"))
}

/// Prints the accuracy over the test set and the prediction for one of its rows.
fn test(network: &Network, test_set: &Dataset, sample: usize) -> Result<(f32, Option<usize>)> {
    let labels = test_set.labels().context("the test set has no labels")?;
    let features = test_set.features();
    let accuracy = network.validate(features, labels).context("testing")?;

    println!("accuracy: {:.2}%", accuracy * 100.);

    if sample >= test_set.len() {
        warn!("sample row {sample} is out of range for {} rows", test_set.len());
        return Ok((accuracy, None));
    }

    let output = network.classify(features.row(sample))?;
    let class = network.class_of(output.view());
    println!(
        "row {sample}: label {}, predicted {class}, output {output}",
        labels[sample]
    );

    Ok((accuracy, Some(class)))
}

fn predict(network: &Network, path: &Path) -> Result<usize> {
    let image = read_image(path).with_context(|| format!("reading image {}", path.display()))?;
    let features = features_of(&image);

    println!("{}", render(features.view(), image.width() as usize));

    let output = network.classify(features.view())?;
    let class = network.class_of(output.view());
    println!("output: {output}");
    println!("predicted class: {class}");

    Ok(class)
}
