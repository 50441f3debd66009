mod backprop;
mod trainer;

pub use backprop::train_one_epoch;
pub use trainer::{EpochReport, Trainer};
