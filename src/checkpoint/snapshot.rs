use crate::{
    NetErr, Result,
    arch::{Network, layers::Dense},
    config::{Architecture, Hyperparameters},
};

/// A snapshot of a `Network`: everything needed to rebuild it, in memory.
///
/// A `Checkpoint` is the restart primitive of training: restoring one yields a network that
/// continues exactly where the captured one was. It is persisted by a `CheckpointStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    architecture: Architecture,
    hyperparameters: Hyperparameters,
    layers: Vec<Dense>,
    epochs_completed: usize,
}

impl Checkpoint {
    /// Captures the current state of `network`.
    pub fn capture(network: &Network) -> Self {
        Self {
            architecture: network.architecture().clone(),
            hyperparameters: *network.hyperparameters(),
            layers: network.layers().to_vec(),
            epochs_completed: network.epochs_completed(),
        }
    }

    pub(super) fn from_parts(
        architecture: Architecture,
        hyperparameters: Hyperparameters,
        layers: Vec<Dense>,
        epochs_completed: usize,
    ) -> Self {
        Self {
            architecture,
            hyperparameters,
            layers,
            epochs_completed,
        }
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    /// Rebuilds the captured network, leaving the checkpoint untouched.
    ///
    /// # Errors
    /// Same as [`Checkpoint::into_network`].
    pub fn restore(&self, architecture: &Architecture) -> Result<Network> {
        self.clone().into_network(architecture)
    }

    /// Rebuilds the captured network, checking it has the expected architecture.
    ///
    /// # Errors
    /// `CheckpointShapeMismatch` if the stored architecture or any layer's shape disagrees with
    /// `architecture`.
    pub fn into_network(self, architecture: &Architecture) -> Result<Network> {
        self.check_shapes(architecture)?;

        let mut network =
            Network::from_layers(self.architecture, self.hyperparameters, self.layers)?;
        network.set_epochs_completed(self.epochs_completed);
        Ok(network)
    }

    /// Rebuilds the captured network with the architecture it was saved with.
    pub fn into_stored_network(self) -> Result<Network> {
        let architecture = self.architecture.clone();
        self.into_network(&architecture)
    }

    fn check_shapes(&self, architecture: &Architecture) -> Result<()> {
        if self.architecture != *architecture {
            return Err(NetErr::CheckpointShapeMismatch {
                tensor: "architecture".into(),
                got: self.architecture.widths().to_vec(),
                expected: architecture.widths().to_vec(),
            });
        }

        if self.layers.len() != architecture.num_layers() {
            return Err(NetErr::CheckpointShapeMismatch {
                tensor: "layers".into(),
                got: vec![self.layers.len()],
                expected: vec![architecture.num_layers()],
            });
        }

        for (i, (layer, (input, output))) in
            self.layers.iter().zip(architecture.layer_dims()).enumerate()
        {
            let weight_shape = layer.weights().shape();
            if weight_shape != [output, input] {
                return Err(NetErr::CheckpointShapeMismatch {
                    tensor: format!("layers.{i}.weight"),
                    got: weight_shape.to_vec(),
                    expected: vec![output, input],
                });
            }

            if layer.biases().len() != output {
                return Err(NetErr::CheckpointShapeMismatch {
                    tensor: format!("layers.{i}.bias"),
                    got: vec![layer.biases().len()],
                    expected: vec![output],
                });
            }
        }

        Ok(())
    }
}
