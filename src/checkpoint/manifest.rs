use serde::{Deserialize, Serialize};

use crate::config::{Architecture, Hyperparameters};

/// The version written into every manifest.
pub(super) const FORMAT_VERSION: u32 = 1;

/// The persisted description of a checkpoint, accompanying its weights file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct Manifest {
    pub version: u32,
    pub architecture: Architecture,
    pub hyperparameters: Hyperparameters,
    pub epochs_completed: usize,
    /// The weights file, relative to the manifest's directory.
    pub weights: String,
}
