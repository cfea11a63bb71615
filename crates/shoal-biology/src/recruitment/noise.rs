//! Multiplicative lognormal process noise on recruitment.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::ProcessConfigError;

/// Mean-one lognormal multiplier `exp(σz − σ²/2)`, switched on from
/// `start_year` onwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LognormalNoise {
    /// Standard deviation of the underlying normal.
    pub sigma: f64,
    /// First simulated year the noise applies to.
    #[serde(default)]
    pub start_year: u32,
}

impl LognormalNoise {
    /// Noise with the given spread and onset.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::Negative`] if `sigma` is negative or
    /// not finite.
    pub fn new(sigma: f64, start_year: u32) -> Result<Self, ProcessConfigError> {
        let noise = Self { sigma, start_year };
        noise.validate()?;
        Ok(noise)
    }

    /// Check `sigma`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn validate(&self) -> Result<(), ProcessConfigError> {
        if !(self.sigma >= 0.0) || !self.sigma.is_finite() {
            return Err(ProcessConfigError::Negative {
                name: "noise sigma",
                value: self.sigma,
            });
        }
        Ok(())
    }

    /// Multiplier for `year`. Before the onset this is exactly `1` and no
    /// random numbers are drawn.
    pub fn multiplier(&self, year: u32, rng: &mut dyn RngCore) -> f64 {
        if year < self.start_year || self.sigma == 0.0 {
            return 1.0;
        }
        let z = standard_normal(rng);
        (self.sigma * z - 0.5 * self.sigma * self.sigma).exp()
    }
}

/// Box-Muller standard normal draw.
pub(crate) fn standard_normal(rng: &mut dyn RngCore) -> f64 {
    let u1 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn inactive_before_start() {
        let noise = LognormalNoise::new(0.5, 10).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(noise.multiplier(9, &mut rng), 1.0);
        assert_ne!(noise.multiplier(10, &mut rng), 1.0);
    }

    #[test]
    fn zero_sigma_is_identity() {
        let noise = LognormalNoise::new(0.0, 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(noise.multiplier(3, &mut rng), 1.0);
    }

    #[test]
    fn mean_effect_is_unbiased() {
        let noise = LognormalNoise::new(0.3, 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| noise.multiplier(0, &mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 1.0).abs() < 0.02, "mean multiplier {mean}");
    }

    #[test]
    fn negative_sigma_rejected() {
        assert!(LognormalNoise::new(-0.1, 0).is_err());
        assert!(LognormalNoise::new(f64::NAN, 0).is_err());
    }

    #[test]
    fn standard_normal_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }
}
