//! Load-balanced redistribution around a burn pass
//!
//! When rebalancing is on, the state is copied onto mirror fields laid out
//! by a knapsack distribution built from the previous burn's cost weights,
//! burned there, and copied back. The mirrors live only for the duration of
//! one call.
//!
//! The parallel copies assume each source field's ghost cells are
//! consistent with its valid cells, so the mirrored state is halo-filled
//! after burning and before the copy back.

use super::burn::{BurnKernel, BurnPhase};
use super::mask::build_interior_boundary_mask;
use super::profiler::ProfilerScope;
use super::reduce::{reduce_burn, BurnOutcome, Diagnostics};
use crate::core_types::Geometry;
use crate::error::ReactError;
use crate::grid::{DistributionMap, MultiFab};
use crate::parallel::Communicator;
use tracing::warn;

/// Mirror layout for a rebalanced burn and the weight field that receives
/// the burn costs
pub struct Rebalance<'a> {
    /// Cost-balanced distribution the burn runs on
    pub dmap: DistributionMap,
    /// Caller's weight field, overwritten with this burn's costs
    pub weights: &'a mut MultiFab,
}

/// Knapsack distribution from a previous call's weights
///
/// Falls back to `fallback` (with a warning) when no usable weights have
/// been recorded yet.
#[must_use]
pub fn balanced_distribution(
    previous: &MultiFab,
    fallback: &DistributionMap,
    comm: &dyn Communicator,
) -> DistributionMap {
    match DistributionMap::from_weight_field(previous, comm) {
        Ok(dmap) => dmap,
        Err(err) => {
            warn!("{err}; burning on the default distribution");
            fallback.clone()
        }
    }
}

/// Burn `state` for `dt`, on mirrors when `rebalance` is given
///
/// Without rebalancing the burn runs directly on the caller's fields with a
/// scratch weight field. Either way the burned state is halo-filled before
/// returning.
///
/// # Arguments
///
/// * `kernel` - Per-cell burn configuration
/// * `geom` - Domain and periodicity
/// * `state` - Caller's state field
/// * `reactions` - Caller's reaction field (expected zeroed)
/// * `rebalance` - Mirror distribution and weight output, if rebalancing
/// * `time`, `dt` - Burn start and interval
/// * `phase` - Which burn of the step this is
/// * `ng` - Ghost width of the burned region
/// * `diagnostics` - Which optional values to reduce
#[allow(clippy::too_many_arguments)]
pub fn burn_with_redistribution(
    kernel: &BurnKernel<'_>,
    geom: &Geometry,
    state: &mut MultiFab,
    reactions: &mut MultiFab,
    rebalance: Option<Rebalance<'_>>,
    time: f64,
    dt: f64,
    phase: BurnPhase,
    ng: usize,
    diagnostics: Diagnostics,
) -> Result<BurnOutcome, ReactError> {
    let timer = ProfilerScope::new("burn_with_redistribution");

    let Some(Rebalance { dmap, weights }) = rebalance else {
        let mask = build_interior_boundary_mask(geom, state.grids(), state.dmap(), ng);
        let mut scratch = MultiFab::new(
            reactions.grids().clone(),
            reactions.dmap().clone(),
            1,
            reactions.n_grow(),
            1.0,
        );
        let report =
            kernel.react_state(state, reactions, &mask, &mut scratch, time, dt, phase, ng)?;
        let outcome = reduce_burn(
            &report,
            reactions,
            &kernel.layout,
            &timer,
            diagnostics,
            kernel.comm,
        );
        state.fill_boundary(geom);
        return Ok(outcome);
    };

    if weights.grids() != state.grids() {
        return Err(ReactError::LayoutMismatch(
            "weight field must cover the state's boxes".to_string(),
        ));
    }

    let mut state_tmp = state.mirror_on(dmap.clone(), 0.0);
    // Cells the burn skips must read as zero after the copy back
    let mut reactions_tmp = reactions.mirror_on(dmap.clone(), 0.0);
    let mut weights_tmp = weights.mirror_on(dmap.clone(), 1.0);
    // The mask depends on which cells are covered under the new assignment,
    // so it is rebuilt rather than copied
    let mask_tmp = build_interior_boundary_mask(geom, state.grids(), &dmap, ng);

    let sng = state.n_grow();
    state_tmp.parallel_copy_from(state, sng, sng)?;

    let report = kernel.react_state(
        &mut state_tmp,
        &mut reactions_tmp,
        &mask_tmp,
        &mut weights_tmp,
        time,
        dt,
        phase,
        ng,
    )?;
    let outcome = reduce_burn(
        &report,
        &reactions_tmp,
        &kernel.layout,
        &timer,
        diagnostics,
        kernel.comm,
    );

    state_tmp.fill_boundary(geom);

    state.parallel_copy_from(&state_tmp, sng, sng)?;
    let rng = reactions.n_grow();
    reactions.parallel_copy_from(&reactions_tmp, rng, rng)?;
    let wng = weights.n_grow();
    weights.parallel_copy_from(&weights_tmp, wng, wng)?;

    Ok(outcome)
}
