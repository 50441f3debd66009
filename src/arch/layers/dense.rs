use ndarray::{Array1, Array2, ArrayView1, Axis, linalg};

use crate::{NetErr, Result, initialization::ParamGen};

/// A fully connected layer: `z = W x + b`.
///
/// `weights` has one row per output unit and one column per input unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    weights: Array2<f32>,
    biases: Array1<f32>,
}

impl Dense {
    /// Creates a new `Dense` from its parameters.
    ///
    /// # Errors
    /// `DimensionMismatch` if there isn't exactly one bias per weight row.
    pub fn new(weights: Array2<f32>, biases: Array1<f32>) -> Result<Self> {
        if weights.nrows() != biases.len() {
            return Err(NetErr::DimensionMismatch {
                what: "biases",
                got: biases.len(),
                expected: weights.nrows(),
            });
        }

        Ok(Self { weights, biases })
    }

    /// Creates a new `Dense` drawing its initial parameters from generators.
    ///
    /// # Arguments
    /// * `dim` - The `(input, output)` widths of the layer.
    /// * `weight_gen` - Generates the `output * input` weights, row by row.
    /// * `bias_gen` - Generates the `output` biases.
    ///
    /// # Errors
    /// `InvalidArchitecture` if a generator is exhausted before filling the layer.
    pub fn init<W, B>(dim: (usize, usize), weight_gen: &mut W, bias_gen: &mut B) -> Result<Self>
    where
        W: ParamGen,
        B: ParamGen,
    {
        let (input, output) = dim;
        let weights = Self::draw(weight_gen, output * input)?;
        let biases = Self::draw(bias_gen, output)?;

        let weights = Array2::from_shape_vec((output, input), weights)
            .map_err(|e| NetErr::InvalidArchitecture(e.to_string()))?;

        Self::new(weights, Array1::from_vec(biases))
    }

    fn draw<G: ParamGen>(param_gen: &mut G, n: usize) -> Result<Vec<f32>> {
        match param_gen.sample(n) {
            Some(sample) if sample.len() == n => Ok(sample),
            sample => Err(NetErr::InvalidArchitecture(format!(
                "parameter generator produced {} of {n} values",
                sample.map_or(0, |s| s.len())
            ))),
        }
    }

    pub fn input_width(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_width(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    /// Computes the raw (pre-activation) output of the layer.
    ///
    /// The caller is responsible for `x` having `input_width` elements.
    pub fn forward(&self, x: ArrayView1<f32>) -> Array1<f32> {
        self.weights.dot(&x) + &self.biases
    }

    /// Propagates `delta` back through the weights: `Wᵀ δ`.
    pub fn backward(&self, delta: ArrayView1<f32>) -> Array1<f32> {
        self.weights.t().dot(&delta)
    }

    /// Takes a gradient descent step: `W -= lr δ xᵀ` and `b -= lr δ`.
    ///
    /// # Arguments
    /// * `delta` - The error of this layer's outputs.
    /// * `x` - The input the layer saw when producing that error.
    /// * `learning_rate` - The length of the step.
    pub fn update(&mut self, delta: ArrayView1<f32>, x: ArrayView1<f32>, learning_rate: f32) {
        let delta_col = delta.insert_axis(Axis(1));
        let x_row = x.insert_axis(Axis(0));

        linalg::general_mat_mul(-learning_rate, &delta_col, &x_row, 1.0, &mut self.weights);
        self.biases.scaled_add(-learning_rate, &delta);
    }
}
