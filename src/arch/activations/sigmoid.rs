/// The logistic sigmoid, `1 / (1 + e^-z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sigmoid;

impl Sigmoid {
    pub fn f(&self, z: f32) -> f32 {
        1. / (1. + (-z).exp())
    }

    /// The derivative written in terms of the activation `a = f(z)`.
    pub fn df(&self, a: f32) -> f32 {
        a * (1. - a)
    }
}
