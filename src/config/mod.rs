mod architecture;
mod hyperparameters;

use std::{fs, path::Path};

use serde::Deserialize;

pub use architecture::Architecture;
pub use hyperparameters::Hyperparameters;

use crate::{NetErr, Result};

/// The description of a network and how to train it, as read from a JSON file.
///
/// ```json
/// { "architecture": [784, 100, 10], "activation": "sigmoid",
///   "learning_rate": 0.1, "epochs": 5, "resume": false }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub architecture: Architecture,
    pub hyperparameters: Hyperparameters,
}

impl Config {
    /// Reads and validates a `Config` from a JSON file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `InvalidArchitecture` or `InvalidConfig` if its
    /// contents are invalid.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses and validates a `Config` from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|e| NetErr::InvalidConfig(e.to_string()))?;

        let architecture = Architecture::new(raw.architecture)?;
        raw.hyperparameters.validate()?;

        Ok(Self {
            architecture,
            hyperparameters: raw.hyperparameters,
        })
    }
}

/// The shape of the JSON file, before validation.
#[derive(Deserialize)]
struct RawConfig {
    architecture: Vec<usize>,
    #[serde(flatten)]
    hyperparameters: Hyperparameters,
}
