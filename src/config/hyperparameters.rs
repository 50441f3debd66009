use serde::{Deserialize, Serialize};

use crate::{NetErr, Result, arch::activations::ActFn};

/// How a network is trained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    #[serde(default)]
    pub activation: ActFn,
    pub learning_rate: f32,
    /// The total amount of epochs a training run should reach.
    pub epochs: usize,
    /// Whether training restarts from the last checkpoint after every epoch and on startup.
    #[serde(default)]
    pub resume: bool,
}

impl Hyperparameters {
    /// Creates a new validated `Hyperparameters` with the sigmoid activation and no resume.
    ///
    /// # Errors
    /// `InvalidConfig` if the learning rate is not a positive finite number or `epochs` is 0.
    pub fn new(learning_rate: f32, epochs: usize) -> Result<Self> {
        let hyperparameters = Self {
            activation: ActFn::default(),
            learning_rate,
            epochs,
            resume: false,
        };

        hyperparameters.validate()?;
        Ok(hyperparameters)
    }

    /// Returns a copy of these hyperparameters with the resume flag set to `resume`.
    pub fn with_resume(self, resume: bool) -> Self {
        Self { resume, ..self }
    }

    /// Returns a copy of these hyperparameters targeting `epochs` epochs.
    pub fn with_epochs(self, epochs: usize) -> Self {
        Self { epochs, ..self }
    }

    /// Checks the invariants of the hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.) {
            return Err(NetErr::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if self.epochs == 0 {
            return Err(NetErr::InvalidConfig(
                "epochs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
