use rand::Rng;
use rand_distr::{Distribution, Uniform};

use super::ParamGen;
use crate::{NetErr, Result};

/// A parameter generator that samples from a probabilistic distribution.
pub struct RandParamGen<'r, R: Rng + ?Sized, D: Distribution<f32>> {
    rng: &'r mut R,
    distribution: D,
    remaining: usize,
}

impl<'r, R: Rng + ?Sized, D: Distribution<f32>> RandParamGen<'r, R, D> {
    /// Creates a new `RandParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(rng: &'r mut R, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<'r, R: Rng + ?Sized> RandParamGen<'r, R, Uniform<f32>> {
    /// Creates a new `RandParamGen` with a uniform distribution over `[low, high)`.
    ///
    /// # Errors
    /// Returns `InvalidArchitecture` if the range is invalid (`low >= high` or not finite).
    pub fn uniform(rng: &'r mut R, limit: usize, low: f32, high: f32) -> Result<Self> {
        let distribution = Uniform::new(low, high)
            .map_err(|e| NetErr::InvalidArchitecture(format!("bad init range: {e}")))?;

        Ok(Self::new(rng, distribution, limit))
    }

    /// Creates a new `RandParamGen` using LeCun uniform initialization, that is, a uniform
    /// distribution over `[-sqrt(3 / fan_in), sqrt(3 / fan_in))`.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `fan_in` - The number of input units of the layer.
    pub fn lecun_uniform(rng: &'r mut R, limit: usize, fan_in: usize) -> Result<Self> {
        let range = (3. / fan_in as f32).sqrt();
        Self::uniform(rng, limit, -range, range)
    }
}

impl<R: Rng + ?Sized, D: Distribution<f32>> ParamGen for RandParamGen<'_, R, D> {
    fn sample(&mut self, mut n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        n = n.min(self.remaining);
        self.remaining -= n;

        let sample = (0..n)
            .map(|_| self.distribution.sample(&mut *self.rng))
            .collect();

        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn lecun_uniform_is_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = (3f32 / 4.).sqrt();

        let mut param_gen = RandParamGen::lecun_uniform(&mut rng, 100, 4).unwrap();
        let sample = param_gen.sample(100).unwrap();

        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|w| (-range..range).contains(w)));
        assert!(sample.iter().any(|&w| w != 0.));
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn same_seed_same_sample() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        let sa = RandParamGen::uniform(&mut a, 5, -1., 1.).unwrap().sample(5);
        let sb = RandParamGen::uniform(&mut b, 5, -1., 1.).unwrap().sample(5);
        assert_eq!(sa, sb);
    }

    #[test]
    fn invalid_range() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(RandParamGen::uniform(&mut rng, 1, 1., -1.).is_err());
    }
}
