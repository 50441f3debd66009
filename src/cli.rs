use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, ValueEnum};
use neural_classifier::{LabelColumn, checkpoint::DEFAULT_MANIFEST_PATH};

/// Trains, evaluates and runs a feed-forward digit classifier.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// CSV file to train with.
    #[arg(long, value_name = "CSV")]
    train: Option<PathBuf>,

    /// CSV file to measure accuracy against, also used for validation while training.
    #[arg(long, value_name = "CSV")]
    test: Option<PathBuf>,

    /// Image to classify.
    #[arg(long, value_name = "IMAGE")]
    predict: Option<PathBuf>,

    /// JSON file with the architecture and hyperparameters.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Manifest of the checkpoint to write to and read from.
    #[arg(long, value_name = "MANIFEST", default_value = DEFAULT_MANIFEST_PATH)]
    checkpoint: PathBuf,

    /// Continue from the last checkpoint, if any.
    #[arg(long)]
    resume: bool,

    /// Standardize every feature column.
    #[arg(long)]
    scale: bool,

    /// Column of the CSV files holding the labels.
    #[arg(long, value_enum, default_value_t = LabelArg::First)]
    label_column: LabelArg,

    /// Row of the test set whose prediction is printed.
    #[arg(long, value_name = "ROW", default_value_t = 0)]
    sample: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LabelArg {
    First,
    Last,
}

impl From<LabelArg> for LabelColumn {
    fn from(value: LabelArg) -> Self {
        match value {
            LabelArg::First => LabelColumn::First,
            LabelArg::Last => LabelColumn::Last,
        }
    }
}

/// Everything a single run has been asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub predict: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub checkpoint: PathBuf,
    pub resume: bool,
    pub scale: bool,
    pub label_column: LabelColumn,
    pub sample: usize,
}

impl TryFrom<Cli> for RunRequest {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.train.is_none() && cli.test.is_none() && cli.predict.is_none() {
            bail!("nothing to do, pass at least one of --train, --test or --predict");
        }

        Ok(Self {
            train: cli.train,
            test: cli.test,
            predict: cli.predict,
            config: cli.config,
            checkpoint: cli.checkpoint,
            resume: cli.resume,
            scale: cli.scale,
            label_column: cli.label_column.into(),
            sample: cli.sample,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(args: &[&str]) -> anyhow::Result<RunRequest> {
        let cli = Cli::try_parse_from(["neural-classifier"].iter().chain(args))?;
        RunRequest::try_from(cli)
    }

    #[test]
    fn defaults() {
        let request = request(&["--train", "train.csv"]).unwrap();

        assert_eq!(request.train, Some(PathBuf::from("train.csv")));
        assert_eq!(request.checkpoint, PathBuf::from(DEFAULT_MANIFEST_PATH));
        assert_eq!(request.label_column, LabelColumn::First);
        assert!(!request.resume && !request.scale);
        assert_eq!(request.sample, 0);
    }

    #[test]
    fn every_flag() {
        let request = request(&[
            "--test",
            "test.csv",
            "--predict",
            "digit.png",
            "--config",
            "net.json",
            "--checkpoint",
            "run/net.json",
            "--resume",
            "--scale",
            "--label-column",
            "last",
            "--sample",
            "7",
        ])
        .unwrap();

        assert_eq!(request.predict, Some(PathBuf::from("digit.png")));
        assert_eq!(request.checkpoint, PathBuf::from("run/net.json"));
        assert_eq!(request.label_column, LabelColumn::Last);
        assert!(request.resume && request.scale);
        assert_eq!(request.sample, 7);
    }

    #[test]
    fn needs_something_to_do() {
        assert!(request(&["--config", "net.json"]).is_err());
    }
}
