//! Whole-fish versus real-valued count arithmetic.

use serde::{Deserialize, Serialize};

/// How processes turn real-valued results back into counts.
///
/// [`Rounding::Whole`] keeps every count integral: mortality rounds half
/// to even, transfers (aging, diffusion, allocation) floor the amount that
/// moves so totals are conserved exactly. [`Rounding::Fractional`] keeps
/// full `f64` precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rounding {
    /// Integral counts.
    #[default]
    Whole,
    /// Real-valued counts.
    Fractional,
}

impl Rounding {
    /// Round a surviving count.
    pub fn survivors(self, value: f64) -> f64 {
        match self {
            Self::Whole => value.round_ties_even(),
            Self::Fractional => value,
        }
    }

    /// Round an amount being moved between bins or cells.
    pub fn transfer(self, value: f64) -> f64 {
        match self {
            Self::Whole => value.floor(),
            Self::Fractional => value,
        }
    }
}
