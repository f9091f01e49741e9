//! Per-level field storage driven by the reactor
//!
//! Holds the state at both time levels, the ghosted copy of the old state
//! that the first Strang half burns, the reaction output at both time
//! levels, and the optional knapsack weights.

use crate::core_types::{BoxArray, Geometry, StateLayout};
use crate::error::ReactError;
use crate::grid::{DistributionMap, MultiFab};
use crate::parallel::Communicator;

/// Ghost widths of a level's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostWidths {
    /// Old and new state
    pub state: usize,
    /// Ghosted pre-hydro state copy
    pub border: usize,
    /// Reaction output
    pub reactions: usize,
}

impl Default for GhostWidths {
    fn default() -> Self {
        Self {
            state: 0,
            border: 4,
            reactions: 0,
        }
    }
}

/// Burn cost weights at both time levels
#[derive(Debug, Clone)]
pub struct KnapsackWeights {
    /// Weights recorded by the previous burn
    pub old: MultiFab,
    /// Weights recorded by the current step's second burn
    pub new: MultiFab,
}

/// Fields of one level
#[derive(Debug, Clone)]
pub struct LevelState {
    /// Domain and periodicity
    pub geom: Geometry,
    /// State component layout
    pub layout: StateLayout,
    /// State at the start of the step
    pub state_old: MultiFab,
    /// State at the end of the step
    pub state_new: MultiFab,
    /// Old state with filled ghost cells, burned by the first half step
    pub sborder: MultiFab,
    /// Reaction output of the first half step
    pub reactions_old: MultiFab,
    /// Reaction output of the second half step (or the full step)
    pub reactions_new: MultiFab,
    /// Cost weights for rebalancing, if enabled
    pub knapsack_weights: Option<KnapsackWeights>,
}

impl LevelState {
    /// Allocate a level with zeroed state and reactions
    ///
    /// # Arguments
    ///
    /// * `geom` - Domain and periodicity
    /// * `grids` - Patch boxes
    /// * `dmap` - Default distribution
    /// * `layout` - State component layout
    /// * `ghosts` - Ghost widths of the fields
    #[must_use]
    pub fn new(
        geom: Geometry,
        grids: &BoxArray,
        dmap: &DistributionMap,
        layout: StateLayout,
        ghosts: GhostWidths,
    ) -> Self {
        let field = |ncomp, ng| MultiFab::new(grids.clone(), dmap.clone(), ncomp, ng, 0.0);
        Self {
            geom,
            layout,
            state_old: field(layout.ncomp(), ghosts.state),
            state_new: field(layout.ncomp(), ghosts.state),
            sborder: field(layout.ncomp(), ghosts.border),
            reactions_old: field(layout.reaction_ncomp(), ghosts.reactions),
            reactions_new: field(layout.reaction_ncomp(), ghosts.reactions),
            knapsack_weights: None,
        }
    }

    /// Carry knapsack weights, initially uniform
    #[must_use]
    pub fn with_knapsack_weights(mut self) -> Self {
        let grids = self.state_old.grids().clone();
        let dmap = self.state_old.dmap().clone();
        let uniform = MultiFab::new(grids, dmap, 1, 0, 1.0);
        self.knapsack_weights = Some(KnapsackWeights {
            old: uniform.clone(),
            new: uniform,
        });
        self
    }

    /// Patch boxes
    #[must_use]
    pub fn grids(&self) -> &BoxArray {
        self.state_old.grids()
    }

    /// Default distribution
    #[must_use]
    pub fn dmap(&self) -> &DistributionMap {
        self.state_old.dmap()
    }

    /// Copy the old state into the ghosted border copy and fill its ghosts
    ///
    /// Ghosts shared with other patches (including periodic images) are
    /// halo-filled; ghosts beyond physical edges are extrapolated.
    pub fn fill_sborder(&mut self) -> Result<(), ReactError> {
        let ng = self.state_old.n_grow();
        self.sborder.parallel_copy_from(&self.state_old, ng, ng)?;
        self.sborder.fill_boundary(&self.geom);
        self.sborder.fill_physical_boundary(&self.geom);
        Ok(())
    }

    /// Advance to the next step: the new time level becomes the old one
    ///
    /// The new state starts out as a copy of the old. The weights recorded
    /// by this step's burns become the previous weights for the next step.
    pub fn swap_time_levels(&mut self) {
        std::mem::swap(&mut self.state_old, &mut self.state_new);
        self.state_new.clone_from(&self.state_old);
        std::mem::swap(&mut self.reactions_old, &mut self.reactions_new);
        if let Some(weights) = self.knapsack_weights.as_mut() {
            std::mem::swap(&mut weights.old, &mut weights.new);
        }
    }

    /// Summed old weight per rank under `dmap`
    ///
    /// Returns `None` when the level carries no weights.
    #[must_use]
    pub fn weights_per_rank(
        &self,
        dmap: &DistributionMap,
        comm: &dyn Communicator,
    ) -> Option<Vec<f64>> {
        let weights = self.knapsack_weights.as_ref()?;
        let mut per_patch = weights.old.sum_valid_per_patch(0, comm);
        comm.reduce_real_sum(&mut per_patch);
        Some(dmap.load_per_rank(&per_patch))
    }
}
