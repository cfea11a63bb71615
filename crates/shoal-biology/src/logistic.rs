//! Scalar logistic growth for the biomass-only mode.

use serde::{Deserialize, Serialize};
use shoal_core::BiomassPool;

use crate::error::ProcessConfigError;

/// `B ← min(K, B + r·B·(1 − B/K))`, applied once a year per pool.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticGrowth {
    /// Intrinsic growth rate `r`.
    pub malthusian: f64,
}

impl LogisticGrowth {
    /// Growth at rate `malthusian`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessConfigError::Negative`] for a negative or
    /// non-finite rate.
    pub fn new(malthusian: f64) -> Result<Self, ProcessConfigError> {
        let growth = Self { malthusian };
        growth.validate()?;
        Ok(growth)
    }

    /// Check the rate.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn validate(&self) -> Result<(), ProcessConfigError> {
        if !(self.malthusian >= 0.0) || !self.malthusian.is_finite() {
            return Err(ProcessConfigError::Negative {
                name: "malthusian",
                value: self.malthusian,
            });
        }
        Ok(())
    }

    /// Grow one pool, returning the biomass added.
    pub fn grow(&self, pool: &mut BiomassPool) -> f64 {
        let k = pool.carrying_capacity;
        let b = pool.biomass;
        if k <= 0.0 || b <= 0.0 || b >= k {
            return 0.0;
        }
        let next = (b + self.malthusian * b * (1.0 - b / k)).min(k);
        let added = next - b;
        pool.biomass = next;
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_towards_capacity() {
        let growth = LogisticGrowth::new(0.5).unwrap();
        let mut pool = BiomassPool::new(400.0, 1000.0);
        assert_eq!(growth.grow(&mut pool), 120.0);
        assert_eq!(pool.biomass, 520.0);
    }

    #[test]
    fn never_exceeds_capacity() {
        let growth = LogisticGrowth::new(3.0).unwrap();
        let mut pool = BiomassPool::new(600.0, 1000.0);
        growth.grow(&mut pool);
        assert_eq!(pool.biomass, 1000.0);
        assert_eq!(growth.grow(&mut pool), 0.0);
    }

    #[test]
    fn empty_pool_stays_empty() {
        let growth = LogisticGrowth::new(1.0).unwrap();
        let mut pool = BiomassPool::new(0.0, 1000.0);
        assert_eq!(growth.grow(&mut pool), 0.0);
        assert_eq!(pool.biomass, 0.0);
    }

    #[test]
    fn negative_rate_rejected() {
        assert!(LogisticGrowth::new(-0.1).is_err());
    }
}
