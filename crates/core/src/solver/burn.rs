//! Per-cell burn executor
//!
//! Every cell of every local patch's grown box is visited independently.
//! The burn runs in two passes so that no cell ever races another:
//!
//! 1. a parallel, read-only pass that integrates each eligible cell and
//!    collects its new state, reaction rates and cost weight
//! 2. a scatter pass that writes the collected values into the fields,
//!    patch by patch
//!
//! Ineligible cells produce nothing and are therefore left untouched in
//! every output field.

use super::limits::ReactLimits;
use super::mask::BURN;
use super::network::{BurnState, ReactionNetwork, SourceForcing};
use super::profiler::ProfilerScope;
use crate::core_types::layout::{EDEN, EINT, RHO, TEMP};
use crate::core_types::{BoxArray, IntVect, StateLayout};
use crate::error::ReactError;
use crate::grid::{DistributionMap, Fab, IMultiFab, MultiFab};
use crate::parallel::Communicator;
use rayon::prelude::*;
use tracing::debug;

/// Which burn of a timestep is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnPhase {
    /// Strang half step before the hydro update
    FirstHalf,
    /// Strang half step after the hydro update
    SecondHalf,
    /// Coupled full step
    FullStep,
}

impl BurnPhase {
    /// Phase tag handed to the burner (1, 2, or 0 for the full step)
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            BurnPhase::FirstHalf => 1,
            BurnPhase::SecondHalf => 2,
            BurnPhase::FullStep => 0,
        }
    }
}

/// Per-rank result of one burn pass, before any reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnReport {
    /// Failing cells per rank (zero for ranks not hosted here)
    pub failures_per_rank: Vec<u32>,
    /// Cells handed to the reaction network
    pub cells_burned: usize,
}

impl BurnReport {
    /// Total failing cells seen by this process
    #[must_use]
    pub fn failed_cells(&self) -> u32 {
        self.failures_per_rank.iter().sum()
    }

    /// Whether every rank hosted here burned without failure
    #[must_use]
    pub fn local_success(&self) -> bool {
        self.failed_cells() == 0
    }
}

/// Everything the per-cell kernel needs besides the fields
pub struct BurnKernel<'a> {
    /// Reaction integrator
    pub network: &'a dyn ReactionNetwork,
    /// State component layout
    pub layout: StateLayout,
    /// Density and temperature bounds
    pub limits: ReactLimits,
    /// Skip cells flagged as shocked
    pub disable_shock_burning: bool,
    /// Decides which patches are burned here
    pub comm: &'a dyn Communicator,
}

/// Values produced for one eligible cell
struct CellOutcome {
    cell: IntVect,
    state: Vec<f64>,
    rates: Vec<f64>,
    weight: f64,
    failed: bool,
}

impl BurnKernel<'_> {
    fn check_layout(
        &self,
        state: &MultiFab,
        reactions: &MultiFab,
        mask: &IMultiFab,
        ng: usize,
    ) -> Result<(), ReactError> {
        let layout = &self.layout;
        if self.network.num_species() != layout.num_species
            || self.network.num_aux() != layout.num_aux
        {
            return Err(ReactError::LayoutMismatch(format!(
                "network evolves {} species and {} aux, state carries {} and {}",
                self.network.num_species(),
                self.network.num_aux(),
                layout.num_species,
                layout.num_aux
            )));
        }
        if state.ncomp() != layout.ncomp() || reactions.ncomp() != layout.reaction_ncomp() {
            return Err(ReactError::LayoutMismatch(format!(
                "state has {} components (expected {}), reactions {} (expected {})",
                state.ncomp(),
                layout.ncomp(),
                reactions.ncomp(),
                layout.reaction_ncomp()
            )));
        }
        if reactions.grids() != state.grids()
            || mask.grids() != state.grids()
            || reactions.dmap() != state.dmap()
            || mask.dmap() != state.dmap()
        {
            return Err(ReactError::LayoutMismatch(
                "state, reactions and mask must share boxes and distribution".to_string(),
            ));
        }
        if ng > state.n_grow() || ng > mask.n_grow() {
            return Err(ReactError::LayoutMismatch(format!(
                "burn ghost width {ng} exceeds state ({}) or mask ({}) ghost width",
                state.n_grow(),
                mask.n_grow()
            )));
        }
        Ok(())
    }

    /// Whether a cell may be burned, judged on the given state patch
    fn is_eligible(&self, u: &[f64], mask: &Fab<i32>, cell: IntVect) -> bool {
        if mask.get(cell, 0) != BURN {
            return false;
        }
        if self.disable_shock_burning {
            if let Some(shk) = self.layout.shock() {
                if u[shk] > 0.0 {
                    return false;
                }
            }
        }
        self.limits.okay_to_burn(u[RHO], u[TEMP])
    }

    /// Burn state built from a conserved state vector
    fn burn_state(&self, u: &[f64]) -> BurnState {
        let layout = &self.layout;
        let rho_inv = 1.0 / u[RHO];
        let xn = (0..layout.num_species)
            .map(|n| u[layout.species(n)] * rho_inv)
            .collect();
        let aux = (0..layout.num_aux)
            .map(|n| u[layout.aux(n)] * rho_inv)
            .collect();
        BurnState::new(u[RHO], u[TEMP], xn, aux)
    }

    /// Fold a finished burn into the state vector and produce the rates
    ///
    /// The composition is measured against the density already in `u`;
    /// `x_start` is the composition the network started from.
    fn apply_burn(&self, u: &mut [f64], burn: &BurnState, x_start: &[f64], dt: f64) -> Vec<f64> {
        let layout = &self.layout;
        let rho = u[RHO];
        let delta_e = burn.e;
        let delta_rho_e = rho * delta_e;

        let mut rates = Vec::with_capacity(layout.reaction_ncomp());
        rates.extend(
            burn.xn
                .iter()
                .zip(x_start)
                .map(|(x_new, x_old)| (x_new - x_old) / dt),
        );
        rates.push(delta_e / dt);
        rates.push(delta_rho_e / dt);

        u[EINT] += delta_rho_e;
        u[EDEN] += delta_rho_e;
        for (n, x) in burn.xn.iter().enumerate() {
            u[layout.species(n)] = rho * x;
        }
        for (n, a) in burn.aux.iter().enumerate() {
            u[layout.aux(n)] = rho * a;
        }
        rates
    }

    /// Operator-split burn of `state` for `dt`
    ///
    /// Weights are reset to 1.0 before the pass and receive the cost of
    /// every eligible cell they contain.
    ///
    /// # Arguments
    ///
    /// * `state` - Conserved state, updated in place
    /// * `reactions` - Reaction rates, written only for eligible cells
    /// * `mask` - Burn mask on the same distribution as `state`
    /// * `weights` - Cost weights on the same boxes as `state`
    /// * `time` - Simulation time at the start of the burn
    /// * `dt` - Burn interval
    /// * `phase` - Which burn of the step this is
    /// * `ng` - Ghost width of the burned region
    ///
    /// # Returns
    ///
    /// Per-rank failure counts
    #[allow(clippy::too_many_arguments)]
    pub fn react_state(
        &self,
        state: &mut MultiFab,
        reactions: &mut MultiFab,
        mask: &IMultiFab,
        weights: &mut MultiFab,
        time: f64,
        dt: f64,
        phase: BurnPhase,
        ng: usize,
    ) -> Result<BurnReport, ReactError> {
        self.check_layout(state, reactions, mask, ng)?;
        if weights.grids() != state.grids() || weights.dmap() != state.dmap() {
            return Err(ReactError::LayoutMismatch(
                "weights must share boxes and distribution with the state".to_string(),
            ));
        }
        let _scope = ProfilerScope::new("react_state");
        debug!(
            "react_state: phase {} time {time} dt {dt} ng {ng}",
            phase.tag()
        );

        weights.set_val(1.0);

        let ncomp = state.ncomp();
        let outcomes = {
            let state = &*state;
            self.burn_cells(state.grids(), state.dmap(), ng, |patch, cell| {
                let fab = state.fab(patch);
                let mut u = vec![0.0; ncomp];
                fab.read_cell(cell, &mut u);
                if !self.is_eligible(&u, mask.fab(patch), cell) {
                    return None;
                }

                let mut burn = self.burn_state(&u);
                let x_start = burn.xn.clone();
                self.network.burn(&mut burn, dt);

                let rates = self.apply_burn(&mut u, &burn, &x_start, dt);
                Some(CellOutcome {
                    cell,
                    state: u,
                    rates,
                    weight: burn.cost_weight(),
                    failed: !burn.success,
                })
            })
        };

        let report = burn_report(state.dmap(), &outcomes);
        scatter(state, reactions, Some(weights), &outcomes);
        Ok(report)
    }

    /// Coupled full-step burn with non-reacting sources
    ///
    /// For each eligible cell (judged on `state_old`) the new state becomes
    /// `U_old + dt * A` with the burn folded in. Ineligible cells of
    /// `state_new` are not touched.
    ///
    /// # Arguments
    ///
    /// * `state_old` - State at the start of the step
    /// * `state_new` - State at the end of the step, written for eligible cells
    /// * `sources` - Summed non-reacting sources `A`
    /// * `reactions` - Reaction rates, written only for eligible cells
    /// * `mask` - Burn mask on the same distribution as the states
    /// * `time`, `dt` - Step start and length
    /// * `iteration` - Deferred-correction iteration
    /// * `ng` - Ghost width of the burned region
    #[allow(clippy::too_many_arguments)]
    pub fn react_state_sdc(
        &self,
        state_old: &MultiFab,
        state_new: &mut MultiFab,
        sources: &MultiFab,
        reactions: &mut MultiFab,
        mask: &IMultiFab,
        time: f64,
        dt: f64,
        iteration: u32,
        ng: usize,
    ) -> Result<BurnReport, ReactError> {
        self.check_layout(state_new, reactions, mask, ng)?;
        for (name, field) in [("old state", state_old), ("sources", sources)] {
            if field.grids() != state_new.grids()
                || field.ncomp() != state_new.ncomp()
                || field.n_grow() < ng
            {
                return Err(ReactError::LayoutMismatch(format!(
                    "{name} does not match the new state"
                )));
            }
        }
        let _scope = ProfilerScope::new("react_state_sdc");
        debug!("react_state_sdc: time {time} dt {dt} iteration {iteration} ng {ng}");

        let layout = self.layout;
        let ncomp = state_new.ncomp();
        let outcomes = self.burn_cells(state_new.grids(), state_new.dmap(), ng, |patch, cell| {
            let mut u = vec![0.0; ncomp];
            state_old.fab(patch).read_cell(cell, &mut u);
            if !self.is_eligible(&u, mask.fab(patch), cell) {
                return None;
            }

            let mut a = vec![0.0; ncomp];
            sources.fab(patch).read_cell(cell, &mut a);
            let forcing = SourceForcing {
                rho: a[RHO],
                rho_e: a[EINT],
                species: (0..layout.num_species).map(|n| a[layout.species(n)]).collect(),
                aux: (0..layout.num_aux).map(|n| a[layout.aux(n)]).collect(),
                iteration,
            };

            let mut burn = self.burn_state(&u);
            for (value, rate) in u.iter_mut().zip(&a) {
                *value += dt * rate;
            }
            let x_start: Vec<f64> = (0..layout.num_species)
                .map(|n| u[layout.species(n)] / u[RHO])
                .collect();

            self.network.burn_with_sources(&mut burn, &forcing, dt);

            let rates = self.apply_burn(&mut u, &burn, &x_start, dt);
            Some(CellOutcome {
                cell,
                state: u,
                rates,
                weight: burn.cost_weight(),
                failed: !burn.success,
            })
        });

        let report = burn_report(state_new.dmap(), &outcomes);
        scatter(state_new, reactions, None, &outcomes);
        Ok(report)
    }

    /// Run `kernel` on every cell of every local patch grown by `ng`
    fn burn_cells<F>(
        &self,
        grids: &BoxArray,
        dmap: &DistributionMap,
        ng: usize,
        kernel: F,
    ) -> Vec<Vec<CellOutcome>>
    where
        F: Fn(usize, IntVect) -> Option<CellOutcome> + Sync,
    {
        (0..grids.len())
            .into_par_iter()
            .map(|patch| {
                if !self.comm.is_local(dmap.owner(patch)) {
                    return Vec::new();
                }
                let bx = grids.grown(patch, ng);
                let cells: Vec<IntVect> = bx.cells().collect();
                cells
                    .into_par_iter()
                    .filter_map(|cell| kernel(patch, cell))
                    .collect()
            })
            .collect()
    }
}

/// Count burned cells and failures per owning rank
fn burn_report(dmap: &DistributionMap, outcomes: &[Vec<CellOutcome>]) -> BurnReport {
    let mut failures_per_rank = vec![0; dmap.n_ranks()];
    let mut cells_burned = 0;
    for (patch, cells) in outcomes.iter().enumerate() {
        cells_burned += cells.len();
        let failed = cells.iter().filter(|c| c.failed).count() as u32;
        failures_per_rank[dmap.owner(patch)] += failed;
    }
    BurnReport {
        failures_per_rank,
        cells_burned,
    }
}

/// Write collected cell outcomes into their patches
fn scatter(
    state: &mut MultiFab,
    reactions: &mut MultiFab,
    weights: Option<&mut MultiFab>,
    outcomes: &[Vec<CellOutcome>],
) {
    state
        .fabs_mut()
        .par_iter_mut()
        .zip(reactions.fabs_mut().par_iter_mut())
        .zip(outcomes.par_iter())
        .for_each(|((fab, rfab), cells)| {
            for outcome in cells {
                fab.write_cell(outcome.cell, &outcome.state);
                // The reaction field may carry fewer ghost cells than the state
                if rfab.contains(outcome.cell) {
                    rfab.write_cell(outcome.cell, &outcome.rates);
                }
            }
        });

    if let Some(weights) = weights {
        weights
            .fabs_mut()
            .par_iter_mut()
            .zip(outcomes.par_iter())
            .for_each(|(wfab, cells)| {
                for outcome in cells {
                    if wfab.contains(outcome.cell) {
                        wfab.set(outcome.cell, 0, outcome.weight);
                    }
                }
            });
    }
}
