//! Runtime configuration of the reactive source engine

use crate::solver::ReactLimits;
use serde::{Deserialize, Serialize};

/// Time integration scheme of the surrounding hydrodynamics solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeIntegration {
    /// Unsplit hydro with Strang-split reactions (two half-step burns)
    CornerTransportUpwind,
    /// Simplified spectral deferred corrections (one coupled full-step burn)
    SimplifiedSdc,
}

/// Configuration for the burn entry points
///
/// All fields have defaults, so partial documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactConfig {
    /// Whether reactions are integrated at all
    pub do_react: bool,
    /// Integration scheme the caller runs
    pub time_integration: TimeIntegration,
    /// Rebalance patches by burn cost before burning
    pub use_custom_knapsack_weights: bool,
    /// Density and temperature bounds outside which cells are not burned
    pub limits: ReactLimits,
    /// Skip cells flagged as inside a shock
    pub disable_shock_burning: bool,
    /// Compute and report the energy added by burning
    pub print_update_diagnostics: bool,
    /// 0 = quiet, 1 = burner entry/exit and timing, 2 = also skip notices
    pub verbose: u8,
    /// Iteration index handed to the coupled full-step kernel
    pub sdc_iteration: u32,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            do_react: true,
            time_integration: TimeIntegration::CornerTransportUpwind,
            use_custom_knapsack_weights: false,
            limits: ReactLimits::default(),
            disable_shock_burning: false,
            print_update_diagnostics: false,
            verbose: 0,
            sdc_iteration: 0,
        }
    }
}
