pub mod arch;
pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod error;
pub mod initialization;
pub mod training;

pub use arch::{Network, Provenance};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use config::{Architecture, Config, Hyperparameters};
pub use dataset::{Dataset, LabelColumn};
pub use error::{NetErr, Result};
pub use training::{EpochReport, Trainer, train_one_epoch};
