//! Global reduction of a burn pass
//!
//! Turns the per-rank failure counts into one success flag for the whole
//! run and gathers the optional diagnostics. Everything is scoped to the
//! call and returned as a value.

use super::burn::BurnReport;
use super::profiler::ProfilerScope;
use crate::core_types::StateLayout;
use crate::grid::MultiFab;
use crate::parallel::Communicator;
use tracing::info;

/// Result of one burn entry point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnOutcome {
    /// True only if no cell on any rank failed
    pub success: bool,
    /// Global sum of the energy-density release rate, when diagnostics are on
    pub energy_added: Option<f64>,
    /// Wall time of the burn, maximum over ranks, when verbose
    pub wall_time: Option<f64>,
}

impl BurnOutcome {
    /// Outcome of a call that had nothing to burn
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            success: true,
            energy_added: None,
            wall_time: None,
        }
    }
}

/// Which diagnostics to gather after a burn pass
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    /// Sum the energy-density release rate
    pub energy_added: bool,
    /// Reduce the wall time
    pub timing: bool,
}

/// Reduce a burn report across ranks
///
/// # Arguments
///
/// * `report` - Failure counts from the executor
/// * `reactions` - Reaction field the pass wrote
/// * `layout` - State layout (locates the energy-density rate)
/// * `timer` - Scope started when the call began
/// * `diagnostics` - Which optional values to compute
/// * `comm` - Communicator for the reductions
#[must_use]
pub fn reduce_burn(
    report: &BurnReport,
    reactions: &MultiFab,
    layout: &StateLayout,
    timer: &ProfilerScope,
    diagnostics: Diagnostics,
    comm: &dyn Communicator,
) -> BurnOutcome {
    let local = i32::from(report.local_success());
    let success = comm.reduce_int_min(local) == 1;

    let energy_added = diagnostics.energy_added.then(|| {
        let e_added = reactions.sum(layout.reaction_rho_energy(), comm);
        if e_added != 0.0 && comm.is_io_process() {
            info!("(rho e) added from burning: {e_added:e}");
        }
        e_added
    });

    let wall_time = diagnostics.timing.then(|| {
        let mut run_time = [timer.elapsed_secs()];
        comm.reduce_real_max(&mut run_time);
        if comm.is_io_process() {
            info!("react_state() time = {:.6} s", run_time[0]);
        }
        run_time[0]
    });

    BurnOutcome {
        success,
        energy_added,
        wall_time,
    }
}
