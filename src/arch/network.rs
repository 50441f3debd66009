use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;

use super::layers::Dense;
use crate::{
    NetErr, Result,
    config::{Architecture, Hyperparameters},
    initialization::{ConstParamGen, RandParamGen},
};

/// Where the current weights of a `Network` come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Freshly drawn from the initial distribution.
    Initialized,
    /// Updated by at least one training pass.
    Trained,
    /// Supplied explicitly, either by hand or from a checkpoint.
    Loaded,
}

/// The activations produced by a forward pass.
///
/// `activations()[0]` is the input and `activations()[i + 1]` is the output of layer `i`.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    activations: Vec<Array1<f32>>,
}

impl ForwardPass {
    pub fn activations(&self) -> &[Array1<f32>] {
        &self.activations
    }

    /// The activation of the last layer, the prediction vector.
    pub fn output(&self) -> &Array1<f32> {
        // never empty, it contains at least the input
        &self.activations[self.activations.len() - 1]
    }

    pub fn into_output(mut self) -> Array1<f32> {
        self.activations.swap_remove(self.activations.len() - 1)
    }
}

/// A feed-forward network: an ordered chain of dense layers sharing one activation function.
///
/// Information flows forward when computing an output and backward when computing the
/// *deltas* of its layers during training.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    architecture: Architecture,
    hyperparameters: Hyperparameters,
    layers: Vec<Dense>,
    epochs_completed: usize,
    provenance: Provenance,
}

impl Network {
    /// Creates a new `Network` with freshly initialized weights, drawn from the thread rng.
    ///
    /// # Errors
    /// `InvalidConfig` if the hyperparameters are invalid.
    pub fn new(architecture: Architecture, hyperparameters: Hyperparameters) -> Result<Self> {
        Self::with_rng(architecture, hyperparameters, &mut rand::rng())
    }

    /// Creates a new `Network` with freshly initialized weights, drawn from `rng`.
    ///
    /// Weights follow a LeCun uniform distribution and biases start at zero.
    ///
    /// # Arguments
    /// * `architecture` - The layer widths.
    /// * `hyperparameters` - How the network will be trained.
    /// * `rng` - A random number generator.
    pub fn with_rng<R: Rng + ?Sized>(
        architecture: Architecture,
        hyperparameters: Hyperparameters,
        rng: &mut R,
    ) -> Result<Self> {
        hyperparameters.validate()?;

        let layers = architecture
            .layer_dims()
            .map(|(input, output)| {
                let mut weight_gen = RandParamGen::lecun_uniform(rng, input * output, input)?;
                let mut bias_gen = ConstParamGen::zeros(output);
                Dense::init((input, output), &mut weight_gen, &mut bias_gen)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            architecture,
            hyperparameters,
            layers,
            epochs_completed: 0,
            provenance: Provenance::Initialized,
        })
    }

    /// Creates a new `Network` out of already built layers.
    ///
    /// # Errors
    /// `InvalidArchitecture` if the layers don't chain as the architecture describes.
    pub fn from_layers(
        architecture: Architecture,
        hyperparameters: Hyperparameters,
        layers: Vec<Dense>,
    ) -> Result<Self> {
        hyperparameters.validate()?;

        if layers.len() != architecture.num_layers() {
            return Err(NetErr::InvalidArchitecture(format!(
                "{architecture} needs {} layers, got {}",
                architecture.num_layers(),
                layers.len()
            )));
        }

        let dims = architecture.layer_dims();
        for (i, (layer, (input, output))) in layers.iter().zip(dims).enumerate() {
            let got = (layer.input_width(), layer.output_width());
            if got != (input, output) {
                return Err(NetErr::InvalidArchitecture(format!(
                    "layer {i} of {architecture} should be {input} -> {output}, got {} -> {}",
                    got.0, got.1
                )));
            }
        }

        Ok(Self {
            architecture,
            hyperparameters,
            layers,
            epochs_completed: 0,
            provenance: Provenance::Loaded,
        })
    }

    /// Replaces the hyperparameters, keeping weights and progress.
    ///
    /// # Errors
    /// `InvalidConfig` if the new hyperparameters are invalid.
    pub fn with_hyperparameters(self, hyperparameters: Hyperparameters) -> Result<Self> {
        hyperparameters.validate()?;
        Ok(Self {
            hyperparameters,
            ..self
        })
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

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// The amount of training passes this network has gone through.
    pub fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    /// The amount of epochs still needed to reach `hyperparameters.epochs`.
    pub fn epochs_remaining(&self) -> usize {
        self.hyperparameters.epochs.saturating_sub(self.epochs_completed)
    }

    pub fn input_width(&self) -> usize {
        self.architecture.input_width()
    }

    pub fn output_width(&self) -> usize {
        self.architecture.output_width()
    }

    /// The amount of classes this network tells apart.
    ///
    /// A single output unit is a binary classifier, so it has 2 classes.
    pub fn num_classes(&self) -> usize {
        self.output_width().max(2)
    }

    /// Makes a forward pass through the network, keeping every activation.
    ///
    /// # Errors
    /// `DimensionMismatch` if `x` doesn't have `input_width` elements.
    pub fn forward(&self, x: ArrayView1<f32>) -> Result<ForwardPass> {
        if x.len() != self.input_width() {
            return Err(NetErr::DimensionMismatch {
                what: "input",
                got: x.len(),
                expected: self.input_width(),
            });
        }

        let act_fn = self.hyperparameters.activation;
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.to_owned());

        for layer in &self.layers {
            let z = layer.forward(activations[activations.len() - 1].view());
            activations.push(act_fn.activate(z));
        }

        Ok(ForwardPass { activations })
    }

    /// Computes the prediction vector for a single input.
    ///
    /// # Errors
    /// `UninitializedNetwork` if the weights were neither trained nor loaded,
    /// `DimensionMismatch` if `x` doesn't have `input_width` elements.
    pub fn classify(&self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        if self.provenance == Provenance::Initialized {
            return Err(NetErr::UninitializedNetwork);
        }

        Ok(self.forward(x)?.into_output())
    }

    /// Computes the predicted class for a single input.
    ///
    /// # Errors
    /// Same as [`Network::classify`].
    pub fn predict_class(&self, x: ArrayView1<f32>) -> Result<usize> {
        let output = self.classify(x)?;
        Ok(self.class_of(output.view()))
    }

    /// Maps a prediction vector to a class index.
    ///
    /// With several outputs this is the argmax, ties going to the lowest index. With a single
    /// output it's `1` whenever the output reaches `0.5`.
    pub fn class_of(&self, output: ArrayView1<f32>) -> usize {
        if self.output_width() == 1 {
            return (output[0] >= 0.5) as usize;
        }

        let mut best = 0;
        for (i, &y) in output.iter().enumerate().skip(1) {
            if y > output[best] {
                best = i;
            }
        }

        best
    }

    /// The expected output for `label`: its one-hot encoding, or the label itself for a single
    /// output network.
    ///
    /// The caller is responsible for `label` being in `[0, num_classes)`.
    pub(crate) fn target(&self, label: usize) -> Array1<f32> {
        if self.output_width() == 1 {
            return Array1::from_elem(1, label as f32);
        }

        let mut target = Array1::zeros(self.output_width());
        target[label] = 1.;
        target
    }

    /// Checks that a labeled dataset can be fed to this network.
    ///
    /// # Errors
    /// `DimensionMismatch` if the features don't have `input_width` columns or there isn't one
    /// label per row, `LabelOutOfRange` for the first invalid label.
    pub(crate) fn check_dataset(
        &self,
        features: ArrayView2<f32>,
        labels: ArrayView1<usize>,
    ) -> Result<()> {
        if features.ncols() != self.input_width() {
            return Err(NetErr::DimensionMismatch {
                what: "feature columns",
                got: features.ncols(),
                expected: self.input_width(),
            });
        }

        if labels.len() != features.nrows() {
            return Err(NetErr::DimensionMismatch {
                what: "labels",
                got: labels.len(),
                expected: features.nrows(),
            });
        }

        let classes = self.num_classes();
        match labels.iter().position(|&label| label >= classes) {
            Some(row) => Err(NetErr::LabelOutOfRange {
                row,
                label: labels[row],
                classes,
            }),
            None => Ok(()),
        }
    }

    /// Computes the fraction of rows whose predicted class matches its label.
    ///
    /// # Errors
    /// `InvalidDataset` if there are no rows, otherwise the same as `check_dataset`.
    pub fn validate(&self, features: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32> {
        self.check_dataset(features, labels)?;

        if features.nrows() == 0 {
            return Err(NetErr::InvalidDataset("there are no samples to validate".into()));
        }

        let mut hits = 0;
        for (x, &label) in features.rows().into_iter().zip(labels) {
            let pass = self.forward(x)?;
            if self.class_of(pass.output().view()) == label {
                hits += 1;
            }
        }

        Ok(hits as f32 / features.nrows() as f32)
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Dense] {
        &mut self.layers
    }

    /// Records that a training pass over the whole dataset has finished.
    pub(crate) fn finish_epoch(&mut self) {
        self.epochs_completed += 1;
        self.provenance = Provenance::Trained;
    }

    pub(crate) fn set_epochs_completed(&mut self, epochs_completed: usize) {
        self.epochs_completed = epochs_completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};
    use rand::{SeedableRng, rngs::StdRng};

    fn hyperparameters() -> Hyperparameters {
        Hyperparameters::new(0.5, 1).unwrap()
    }

    fn identity_net() -> Network {
        let layer = Dense::new(array![[1., 0.], [0., 1.]], array![0., 0.]).unwrap();
        let arch = Architecture::new([2, 2]).unwrap();
        Network::from_layers(arch, hyperparameters(), vec![layer]).unwrap()
    }

    #[test]
    fn layers_chain_for_valid_architectures() {
        let mut rng = StdRng::seed_from_u64(1);
        let archs: [&[usize]; 5] = [&[1, 1], &[2, 2, 1], &[3, 2], &[784, 100, 10], &[5, 4, 3, 2]];

        for widths in archs {
            let arch = Architecture::new(widths.iter().copied()).unwrap();
            let net = Network::with_rng(arch, hyperparameters(), &mut rng).unwrap();

            assert_eq!(net.layers().len(), widths.len() - 1);
            for (i, layer) in net.layers().iter().enumerate() {
                assert_eq!(layer.input_width(), widths[i]);
                assert_eq!(layer.output_width(), widths[i + 1]);
            }
        }
    }

    #[test]
    fn initial_weights_break_symmetry() {
        let mut rng = StdRng::seed_from_u64(2);
        let arch = Architecture::new([4, 3, 2]).unwrap();
        let net = Network::with_rng(arch, hyperparameters(), &mut rng).unwrap();

        for layer in net.layers() {
            assert!(layer.weights().iter().any(|&w| w != 0.), "all-zero weights");
            let range = (3. / layer.input_width() as f32).sqrt();
            assert!(layer.weights().iter().all(|w| w.abs() <= range));
            assert!(layer.biases().iter().all(|&b| b == 0.));
        }

        let first = net.layers()[0].weights();
        assert_ne!(first.row(0), first.row(1), "identical rows don't break symmetry");
        assert_eq!(net.provenance(), Provenance::Initialized);
    }

    #[test]
    fn from_layers_checks_chaining() {
        let arch = Architecture::new([2, 3, 1]).unwrap();
        let l0 = Dense::new(Array2::zeros((3, 2)), Array1::zeros(3)).unwrap();
        let bad = Dense::new(Array2::zeros((1, 2)), Array1::zeros(1)).unwrap();

        let res = Network::from_layers(arch.clone(), hyperparameters(), vec![l0.clone()]);
        assert!(matches!(res, Err(NetErr::InvalidArchitecture(_))));

        let res = Network::from_layers(arch, hyperparameters(), vec![l0, bad]);
        assert!(matches!(res, Err(NetErr::InvalidArchitecture(_))));
    }

    #[test]
    fn forward_matches_hand_computation() {
        let layer = Dense::new(
            array![[0.1, 0.2, 0.3], [-0.4, 0.5, -0.6]],
            array![0.1, -0.2],
        )
        .unwrap();
        let arch = Architecture::new([3, 2]).unwrap();
        let net = Network::from_layers(arch, hyperparameters(), vec![layer]).unwrap();

        // z = [1.5, -1.4]
        let expected = [0.817_574_5_f32, 0.197_816_1];
        let output = net.classify(array![1., 2., 3.].view()).unwrap();

        for (y, e) in output.iter().zip(expected) {
            assert!((y - e).abs() < 1e-6, "got {output}, expected {expected:?}");
        }
    }

    #[test]
    fn forward_keeps_every_activation() {
        let mut rng = StdRng::seed_from_u64(3);
        let arch = Architecture::new([4, 3, 2]).unwrap();
        let net = Network::with_rng(arch, hyperparameters(), &mut rng).unwrap();

        let x = array![0.1, 0.2, 0.3, 0.4];
        let pass = net.forward(x.view()).unwrap();

        let widths: Vec<_> = pass.activations().iter().map(|a| a.len()).collect();
        assert_eq!(widths, [4, 3, 2]);
        assert_eq!(pass.activations()[0], x);
        assert!(pass.output().iter().all(|&a| a > 0. && a < 1.));
    }

    #[test]
    fn wrong_input_length() {
        let net = identity_net();
        let before = net.clone();

        for x in [array![1.], array![1., 2., 3.]] {
            let res = net.forward(x.view());
            assert!(matches!(
                res,
                Err(NetErr::DimensionMismatch { what: "input", expected: 2, .. })
            ));
        }

        assert_eq!(net, before);
    }

    #[test]
    fn classify_requires_real_weights() {
        let mut rng = StdRng::seed_from_u64(4);
        let arch = Architecture::new([2, 2]).unwrap();
        let net = Network::with_rng(arch, hyperparameters(), &mut rng).unwrap();

        let res = net.classify(array![1., 0.].view());
        assert!(matches!(res, Err(NetErr::UninitializedNetwork)));
    }

    #[test]
    fn validate_bounds() {
        let net = identity_net();
        let features = array![[1., 0.], [0., 1.], [2., 0.]];

        let acc = net.validate(features.view(), array![0, 1, 0].view()).unwrap();
        assert_eq!(acc, 1.);

        let acc = net.validate(features.view(), array![1, 0, 1].view()).unwrap();
        assert_eq!(acc, 0.);

        let acc = net.validate(features.view(), array![0, 0, 1].view()).unwrap();
        assert!((0. ..=1.).contains(&acc));
        assert!((acc - 1. / 3.).abs() < 1e-6);
    }

    #[test]
    fn validate_checks_the_dataset() {
        let net = identity_net();

        let res = net.validate(array![[1., 0.]].view(), array![2].view());
        assert!(matches!(
            res,
            Err(NetErr::LabelOutOfRange { row: 0, label: 2, classes: 2 })
        ));

        let res = net.validate(array![[1., 0., 0.]].view(), array![0].view());
        assert!(matches!(res, Err(NetErr::DimensionMismatch { .. })));

        let res = net.validate(array![[1., 0.]].view(), array![0, 1].view());
        assert!(matches!(res, Err(NetErr::DimensionMismatch { what: "labels", .. })));

        let res = net.validate(Array2::zeros((0, 2)).view(), Array1::zeros(0).view());
        assert!(matches!(res, Err(NetErr::InvalidDataset(_))));
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let net = identity_net();
        assert_eq!(net.class_of(array![0.5, 0.5].view()), 0);
        assert_eq!(net.class_of(array![0.2, 0.7].view()), 1);
    }

    #[test]
    fn single_output_is_binary() {
        let layer = Dense::new(array![[1., -1.]], array![0.]).unwrap();
        let arch = Architecture::new([2, 1]).unwrap();
        let net = Network::from_layers(arch, hyperparameters(), vec![layer]).unwrap();

        assert_eq!(net.num_classes(), 2);
        assert_eq!(net.target(1), array![1.]);
        assert_eq!(net.predict_class(array![2., 0.].view()).unwrap(), 1);
        assert_eq!(net.predict_class(array![0., 2.].view()).unwrap(), 0);
    }

    #[test]
    fn one_hot_target() {
        let arch = Architecture::new([2, 4]).unwrap();
        let layer = Dense::new(Array2::zeros((4, 2)), Array1::zeros(4)).unwrap();
        let net = Network::from_layers(arch, hyperparameters(), vec![layer]).unwrap();

        assert_eq!(net.target(2), array![0., 0., 1., 0.]);
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Network>();
    }
}
