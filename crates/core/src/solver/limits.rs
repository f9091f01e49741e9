//! Burn limiters and the global eligibility pre-check
//!
//! Cells are only burned when their density and temperature fall inside the
//! configured bounds. Before a burn pass the engine runs a cheap global
//! check: if the reduced extrema of density and temperature show that no
//! cell anywhere can satisfy the bounds, the whole pass is skipped.

use crate::core_types::layout::{RHO, TEMP};
use crate::grid::MultiFab;
use crate::parallel::Communicator;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A lower limiter below this value is treated as inactive
const SMALL: f64 = 1.0e-10;

/// An upper limiter above this value is treated as inactive
const LARGE: f64 = 1.0e199;

/// Density and temperature bounds for burning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactLimits {
    /// Minimum density to burn
    pub rho_min: f64,
    /// Maximum density to burn
    pub rho_max: f64,
    /// Minimum temperature to burn
    pub t_min: f64,
    /// Maximum temperature to burn
    pub t_max: f64,
}

impl Default for ReactLimits {
    fn default() -> Self {
        Self {
            rho_min: 0.0,
            rho_max: 1.0e200,
            t_min: 0.0,
            t_max: 1.0e200,
        }
    }
}

impl ReactLimits {
    /// Whether a cell with this density and temperature may be burned
    #[inline]
    #[must_use]
    pub fn okay_to_burn(&self, rho: f64, t: f64) -> bool {
        rho >= self.rho_min && rho <= self.rho_max && t >= self.t_min && t <= self.t_max
    }

    /// Whether any of the four limiters is active
    #[must_use]
    pub fn is_limiting(&self) -> bool {
        self.limit_small_rho()
            || self.limit_large_rho()
            || self.limit_small_t()
            || self.limit_large_t()
    }

    fn limit_small_rho(&self) -> bool {
        self.rho_min >= SMALL
    }

    fn limit_large_rho(&self) -> bool {
        self.rho_max <= LARGE
    }

    fn limit_small_t(&self) -> bool {
        self.t_min >= SMALL
    }

    fn limit_large_t(&self) -> bool {
        self.t_max <= LARGE
    }
}

/// Next reduced extremum for an active limiter, the neutral value otherwise
fn unpack(active: bool, values: &mut std::vec::IntoIter<f64>, neutral: f64) -> f64 {
    if active {
        values.next().unwrap_or(neutral)
    } else {
        neutral
    }
}

/// Decide whether any cell in the whole domain can possibly be burned
///
/// Only the extrema needed by active limiters are computed (over valid
/// cells of local patches) and reduced, so the check stays cheap compared
/// to a burn pass. Returns `true` unless it is certain that no cell in the
/// domain satisfies the bounds.
///
/// # Arguments
///
/// * `state` - State field to inspect
/// * `limits` - Burn limiters
/// * `comm` - Communicator used for the min/max reductions
/// * `verbose` - Logs the skip when 2 or higher
pub fn valid_zones_to_burn(
    state: &MultiFab,
    limits: &ReactLimits,
    comm: &dyn Communicator,
    verbose: u8,
) -> bool {
    if !limits.is_limiting() {
        return true;
    }

    // A lower bound is tested against the domain maximum and an upper
    // bound against the domain minimum
    let mut small_limiters = Vec::with_capacity(2);
    let mut large_limiters = Vec::with_capacity(2);

    if limits.limit_large_rho() {
        small_limiters.push(state.min_local(RHO, comm));
    }
    if limits.limit_large_t() {
        small_limiters.push(state.min_local(TEMP, comm));
    }
    if limits.limit_small_rho() {
        large_limiters.push(state.max_local(RHO, comm));
    }
    if limits.limit_small_t() {
        large_limiters.push(state.max_local(TEMP, comm));
    }

    if !small_limiters.is_empty() {
        comm.reduce_real_min(&mut small_limiters);
    }
    if !large_limiters.is_empty() {
        comm.reduce_real_max(&mut large_limiters);
    }

    // Unpack in push order; an inactive limiter keeps its neutral default
    let mut small = small_limiters.into_iter();
    let mut large = large_limiters.into_iter();
    let small_dens = unpack(limits.limit_large_rho(), &mut small, SMALL);
    let small_t = unpack(limits.limit_large_t(), &mut small, SMALL);
    let large_dens = unpack(limits.limit_small_rho(), &mut large, LARGE);
    let large_t = unpack(limits.limit_small_t(), &mut large, LARGE);

    if large_dens >= limits.rho_min
        && small_dens <= limits.rho_max
        && large_t >= limits.t_min
        && small_t <= limits.t_max
    {
        return true;
    }

    if verbose > 1 && comm.is_io_process() {
        debug!("No valid zones to burn, skipping react_state()");
    }

    false
}
