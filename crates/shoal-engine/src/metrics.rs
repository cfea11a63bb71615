//! Per-tick timing and recruitment metrics.

use shoal_core::SpeciesId;

/// Timings and recruit counts collected during a single tick.
///
/// All durations are in microseconds and summed over species. The world
/// fills these in during each [`step`](crate::BiologyWorld::step);
/// consumers read them from the most recent tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Simulated day the tick covered.
    pub day: u64,
    /// Wall-clock time for the entire tick.
    pub total_us: u64,
    /// Time spent in natural mortality.
    pub mortality_us: u64,
    /// Time spent aging.
    pub aging_us: u64,
    /// Time spent diffusing.
    pub diffusion_us: u64,
    /// Time spent computing and placing recruits.
    pub recruitment_us: u64,
    /// Time spent growing biomass-only species.
    pub biomass_us: u64,
    /// Recruits placed this tick, for species that recruited.
    pub recruits: Vec<(SpeciesId, u64)>,
}

impl StepMetrics {
    /// Recruits placed for `species` this tick.
    pub fn recruits_for(&self, species: SpeciesId) -> Option<u64> {
        self.recruits
            .iter()
            .find(|(id, _)| *id == species)
            .map(|&(_, n)| n)
    }
}

pub(crate) fn micros(start: std::time::Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.mortality_us, 0);
        assert_eq!(m.diffusion_us, 0);
        assert!(m.recruits.is_empty());
    }

    #[test]
    fn recruits_lookup() {
        let m = StepMetrics {
            recruits: vec![(SpeciesId(0), 12), (SpeciesId(2), 0)],
            ..StepMetrics::default()
        };
        assert_eq!(m.recruits_for(SpeciesId(0)), Some(12));
        assert_eq!(m.recruits_for(SpeciesId(2)), Some(0));
        assert_eq!(m.recruits_for(SpeciesId(1)), None);
    }
}
