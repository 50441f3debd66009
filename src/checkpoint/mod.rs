mod manifest;
mod snapshot;
mod store;

pub use snapshot::Checkpoint;
pub use store::{CheckpointStore, DEFAULT_MANIFEST_PATH, load, save};
