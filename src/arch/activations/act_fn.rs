use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::Sigmoid;

/// The activation kinds a network can be configured with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFn {
    #[default]
    Sigmoid,
}

impl ActFn {
    pub fn f(&self, z: f32) -> f32 {
        match self {
            ActFn::Sigmoid => Sigmoid.f(z),
        }
    }

    /// The derivative of the activation, given the activation itself (not the raw input).
    pub fn df(&self, a: f32) -> f32 {
        match self {
            ActFn::Sigmoid => Sigmoid.df(a),
        }
    }

    /// Applies the activation elementwise, consuming the raw layer output.
    pub fn activate(&self, z: Array1<f32>) -> Array1<f32> {
        z.mapv_into(|z| self.f(z))
    }

    /// Applies the derivative elementwise over already computed activations.
    pub fn derivative(&self, a: ArrayView1<f32>) -> Array1<f32> {
        a.mapv(|a| self.df(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn deserializes_from_snake_case() {
        let act_fn: ActFn = serde_json::from_str("\"sigmoid\"").unwrap();
        assert_eq!(act_fn, ActFn::Sigmoid);
        assert!(serde_json::from_str::<ActFn>("\"relu\"").is_err());
    }

    #[test]
    fn elementwise() {
        let a = ActFn::Sigmoid.activate(array![0., 0.]);
        assert_eq!(a, array![0.5, 0.5]);
        assert_eq!(ActFn::Sigmoid.derivative(a.view()), array![0.25, 0.25]);
    }
}
