use log::{debug, info, warn};
use ndarray::{ArrayView1, ArrayView2};

use super::train_one_epoch;
use crate::{
    Result,
    arch::Network,
    checkpoint::{Checkpoint, CheckpointStore},
};

/// What happened during one epoch of a `Trainer` run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// One-based, counted over the whole life of the network.
    pub epoch: usize,
    pub loss: f32,
    /// Accuracy over the validation set, if there is one and it could be validated.
    pub accuracy: Option<f32>,
}

/// Drives a `Network` through its epochs, checkpointing after each one.
///
/// The learning rate, the amount of epochs and whether to resume from the last checkpoint come
/// from the network's own hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct Trainer<'v> {
    store: Option<CheckpointStore>,
    validation: Option<(ArrayView2<'v, f32>, ArrayView1<'v, usize>)>,
    reload_from_disk: bool,
}

impl<'v> Trainer<'v> {
    /// Creates a new `Trainer` that neither persists nor validates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a checkpoint into `store` after every epoch.
    pub fn with_store(mut self, store: CheckpointStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the network against this dataset after every epoch.
    pub fn with_validation(
        mut self,
        features: ArrayView2<'v, f32>,
        labels: ArrayView1<'v, usize>,
    ) -> Self {
        self.validation = Some((features, labels));
        self
    }

    /// When resuming, restores the network from the persisted checkpoint rather than the one
    /// kept in memory. Has no effect without a store.
    pub fn reload_from_disk(mut self, reload: bool) -> Self {
        self.reload_from_disk = reload;
        self
    }

    pub fn store(&self) -> Option<&CheckpointStore> {
        self.store.as_ref()
    }

    /// Trains `network` until it completes the epochs its hyperparameters ask for.
    ///
    /// # Arguments
    /// * `network` - The network to train, possibly halfway through its epochs.
    /// * `features` - One training sample per row.
    /// * `labels` - The class of each training row.
    ///
    /// # Returns
    /// A report for each epoch run, which is none if the network had already finished.
    ///
    /// # Errors
    /// Any error from an epoch or from saving or restoring a checkpoint; the remaining epochs
    /// are not run. Validation errors are logged and don't stop training.
    pub fn train(
        &self,
        network: &mut Network,
        features: ArrayView2<f32>,
        labels: ArrayView1<usize>,
    ) -> Result<Vec<EpochReport>> {
        let target = network.hyperparameters().epochs;
        let resume = network.hyperparameters().resume;

        if network.epochs_remaining() == 0 {
            info!(
                "network already completed {} of {target} epochs, nothing to train",
                network.epochs_completed()
            );
            return Ok(Vec::new());
        }

        info!(
            "training {} from epoch {} to {target}",
            network.architecture(),
            network.epochs_completed() + 1
        );

        let mut reports = Vec::with_capacity(network.epochs_remaining());
        while network.epochs_remaining() > 0 {
            let loss = train_one_epoch(network, features, labels)?;
            let epoch = network.epochs_completed();

            let accuracy = self.validate(network);
            match accuracy {
                Some(accuracy) => info!("epoch {epoch}/{target}: loss {loss:.6}, accuracy {accuracy:.4}"),
                None => info!("epoch {epoch}/{target}: loss {loss:.6}"),
            }

            let restart = resume && network.epochs_remaining() > 0;
            if self.needs_checkpoint(restart) {
                let checkpoint = Checkpoint::capture(network);
                if let Some(store) = &self.store {
                    store.save(&checkpoint)?;
                }

                if restart {
                    *network = self.restore(checkpoint, network)?;
                }
            }

            reports.push(EpochReport {
                epoch,
                loss,
                accuracy,
            });
        }

        Ok(reports)
    }

    /// Whether the epoch that just finished has to be captured, either to persist it or to
    /// restart from it.
    fn needs_checkpoint(&self, restart: bool) -> bool {
        self.store.is_some() || restart
    }

    fn validate(&self, network: &Network) -> Option<f32> {
        let (features, labels) = self.validation?;

        network
            .validate(features, labels)
            .inspect_err(|e| warn!("skipping validation: {e}"))
            .ok()
    }

    /// Rebuilds the network out of the checkpoint it just produced.
    fn restore(&self, checkpoint: Checkpoint, network: &Network) -> Result<Network> {
        match &self.store {
            Some(store) if self.reload_from_disk => {
                debug!("reloading network from {}", store.manifest_path().display());
                store.load_network(network.architecture())
            }
            _ => checkpoint.into_network(network.architecture()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Architecture, Hyperparameters};
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    fn network(epochs: usize, resume: bool) -> Network {
        let arch = Architecture::new([2, 3, 2]).unwrap();
        let hyperparameters = Hyperparameters::new(0.5, epochs)
            .unwrap()
            .with_resume(resume);
        Network::with_rng(arch, hyperparameters, &mut StdRng::seed_from_u64(21)).unwrap()
    }

    #[test]
    fn captures_only_when_persisting_or_restarting() {
        let plain = Trainer::new();
        assert!(!plain.needs_checkpoint(false));
        assert!(plain.needs_checkpoint(true));

        let stored = Trainer::new().with_store(CheckpointStore::new("unused/manifest.json"));
        assert!(stored.needs_checkpoint(false));
        assert!(stored.needs_checkpoint(true));
    }

    #[test]
    fn runs_the_remaining_epochs() {
        let features = array![[0., 0.], [1., 1.]];
        let labels = array![0, 1];
        let mut net = network(3, false);

        let reports = Trainer::new()
            .train(&mut net, features.view(), labels.view())
            .unwrap();

        let epochs: Vec<_> = reports.iter().map(|r| r.epoch).collect();
        assert_eq!(epochs, [1, 2, 3]);
        assert!(reports.iter().all(|r| r.accuracy.is_none()));
        assert_eq!(net.epochs_completed(), 3);

        let again = Trainer::new()
            .train(&mut net, features.view(), labels.view())
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn resuming_in_memory_matches_plain_training() {
        let features = array![[0., 1.], [1., 0.], [1., 1.]];
        let labels = array![1, 1, 0];

        let mut plain = network(4, false);
        let mut resumed = network(4, true);

        let a = Trainer::new()
            .train(&mut plain, features.view(), labels.view())
            .unwrap();
        let b = Trainer::new()
            .train(&mut resumed, features.view(), labels.view())
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(plain.layers(), resumed.layers());
        assert_eq!(resumed.epochs_completed(), 4);
    }

    #[test]
    fn reports_validation_accuracy() {
        let features = array![[0., 0.], [1., 1.]];
        let labels = array![0, 1];
        let mut net = network(2, false);

        let reports = Trainer::new()
            .with_validation(features.view(), labels.view())
            .train(&mut net, features.view(), labels.view())
            .unwrap();

        for report in reports {
            let accuracy = report.accuracy.unwrap();
            assert!((0. ..=1.).contains(&accuracy));
        }
    }

    #[test]
    fn failed_validation_does_not_stop_training() {
        let features = array![[0., 0.], [1., 1.]];
        let labels = array![0, 1];
        let bad_labels = array![0, 9];
        let mut net = network(2, false);

        let reports = Trainer::new()
            .with_validation(features.view(), bad_labels.view())
            .train(&mut net, features.view(), labels.view())
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.accuracy.is_none()));
    }

    #[test]
    fn failed_epoch_aborts() {
        let features = array![[0., 0.], [1., 1.]];
        let mut net = network(3, false);

        let res = Trainer::new().train(&mut net, features.view(), array![0, 5].view());
        assert!(res.is_err());
        assert_eq!(net.epochs_completed(), 0);
    }
}
