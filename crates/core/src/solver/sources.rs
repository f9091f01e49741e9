//! Non-reacting source terms for the coupled full-step burn

use crate::grid::MultiFab;
use crate::simulation::LevelState;

/// Supplies the sum of every non-reacting source for a step
///
/// `out` has the state's component layout and ghost width; the provider
/// writes the rate of change of each conserved component.
pub trait SourceProvider: Send + Sync {
    /// Fill `out` with the summed non-reacting sources of `level`
    fn sum_of_sources(&self, level: &LevelState, time: f64, dt: f64, out: &mut MultiFab);
}

/// No non-reacting sources
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroSources;

impl SourceProvider for ZeroSources {
    fn sum_of_sources(&self, _level: &LevelState, _time: f64, _dt: f64, out: &mut MultiFab) {
        out.set_val(0.0);
    }
}

/// The same rate for every cell, one entry per state component
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformSources {
    /// Rate of change per component; components past the end get zero
    pub rates: Vec<f64>,
}

impl SourceProvider for UniformSources {
    fn sum_of_sources(&self, _level: &LevelState, _time: f64, _dt: f64, out: &mut MultiFab) {
        out.set_val(0.0);
        for fab in out.fabs_mut() {
            let bx = fab.bx();
            for (comp, &rate) in self.rates.iter().enumerate().take(fab.ncomp()) {
                fab.fill_region(&bx, comp, rate);
            }
        }
    }
}
