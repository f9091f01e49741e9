//! Burn entry points of a timestep
//!
//! Strang splitting burns twice per step around the hydro update:
//! [`Reactor::strang_react_first_half`] on the ghosted pre-hydro state and
//! [`Reactor::strang_react_second_half`] on the valid cells of the
//! post-hydro state. Simplified SDC burns once per step, coupled to the
//! non-reacting sources, through [`Reactor::react_state_sdc`].

use super::level::{KnapsackWeights, LevelState};
use crate::config::{ReactConfig, TimeIntegration};
use crate::core_types::StateLayout;
use crate::error::ReactError;
use crate::grid::MultiFab;
use crate::parallel::Communicator;
use crate::solver::{
    balanced_distribution, build_interior_boundary_mask, burn_with_redistribution, reduce_burn,
    valid_zones_to_burn, BurnKernel, BurnOutcome, BurnPhase, Diagnostics, ProfilerScope,
    ReactionNetwork, Rebalance, SourceProvider, StateCleaner,
};
use tracing::info;

/// Drives the reaction network over a level
pub struct Reactor {
    config: ReactConfig,
    network: Box<dyn ReactionNetwork>,
    cleaner: Box<dyn StateCleaner>,
    comm: Box<dyn Communicator>,
}

impl Reactor {
    /// Create a reactor
    ///
    /// # Arguments
    ///
    /// * `config` - Burn configuration
    /// * `network` - Reaction integrator
    /// * `cleaner` - Post-burn consistency repair
    /// * `comm` - Communicator of the run
    #[must_use]
    pub fn new(
        config: ReactConfig,
        network: Box<dyn ReactionNetwork>,
        cleaner: Box<dyn StateCleaner>,
        comm: Box<dyn Communicator>,
    ) -> Self {
        Self {
            config,
            network,
            cleaner,
            comm,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ReactConfig {
        &self.config
    }

    /// Mutable configuration
    pub fn config_mut(&mut self) -> &mut ReactConfig {
        &mut self.config
    }

    /// Communicator of the run
    #[must_use]
    pub fn comm(&self) -> &dyn Communicator {
        self.comm.as_ref()
    }

    fn require(&self, operation: &'static str, method: TimeIntegration) -> Result<(), ReactError> {
        if self.config.time_integration == method {
            Ok(())
        } else {
            Err(ReactError::UnsupportedIntegration {
                operation,
                configured: self.config.time_integration,
            })
        }
    }

    fn kernel(&self, layout: StateLayout) -> BurnKernel<'_> {
        BurnKernel {
            network: self.network.as_ref(),
            layout,
            limits: self.config.limits,
            disable_shock_burning: self.config.disable_shock_burning,
            comm: self.comm.as_ref(),
        }
    }

    fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            energy_added: self.config.print_update_diagnostics,
            timing: self.config.verbose > 0,
        }
    }

    fn announce(&self, message: &str) {
        if self.config.verbose > 0 && self.comm.is_io_process() {
            info!("{message}");
        }
    }

    /// Burn the ghosted pre-hydro state for `dt`
    ///
    /// Zeroes `reactions_old` first so it is defined even when nothing
    /// burns. With rebalancing on, the burn runs on a distribution built
    /// from the old weights, which then receive this burn's costs.
    ///
    /// # Errors
    ///
    /// `UnsupportedIntegration` under simplified SDC; `LayoutMismatch` when
    /// rebalancing is requested on a level without weights or the fields
    /// disagree.
    pub fn strang_react_first_half(
        &self,
        level: &mut LevelState,
        time: f64,
        dt: f64,
    ) -> Result<BurnOutcome, ReactError> {
        self.require(
            "strang_react_first_half",
            TimeIntegration::CornerTransportUpwind,
        )?;

        level.reactions_old.set_val(0.0);

        if !self.config.do_react {
            return Ok(BurnOutcome::skipped());
        }

        let comm = self.comm.as_ref();
        if !valid_zones_to_burn(&level.sborder, &self.config.limits, comm, self.config.verbose) {
            return Ok(BurnOutcome::skipped());
        }

        let ng = level.sborder.n_grow();

        let rebalance = if self.config.use_custom_knapsack_weights {
            let weights = knapsack_weights(&mut level.knapsack_weights)?;
            // The old weights hold the last burn of the previous step
            let dmap = balanced_distribution(&weights.old, level.sborder.dmap(), comm);
            Some(Rebalance {
                dmap,
                weights: &mut weights.old,
            })
        } else {
            None
        };

        self.announce("Entering burner and doing half-timestep of burning");
        let outcome = burn_with_redistribution(
            &self.kernel(level.layout),
            &level.geom,
            &mut level.sborder,
            &mut level.reactions_old,
            rebalance,
            time,
            dt,
            BurnPhase::FirstHalf,
            ng,
            self.diagnostics(),
        )?;
        self.announce("Leaving burner after completing half-timestep of burning");

        self.cleaner
            .clean_state(&mut level.sborder, &level.layout, time, ng, comm);

        Ok(outcome)
    }

    /// Burn the valid cells of the post-hydro state for `dt`
    ///
    /// Zeroes `reactions_new` and resets the new weights to uniform before
    /// burning. With rebalancing on, the distribution comes from the
    /// weights written by the first half step.
    ///
    /// # Errors
    ///
    /// Same as [`Reactor::strang_react_first_half`]
    pub fn strang_react_second_half(
        &self,
        level: &mut LevelState,
        time: f64,
        dt: f64,
    ) -> Result<BurnOutcome, ReactError> {
        self.require(
            "strang_react_second_half",
            TimeIntegration::CornerTransportUpwind,
        )?;

        level.reactions_new.set_val(0.0);
        if let Some(weights) = level.knapsack_weights.as_mut() {
            weights.new.set_val(1.0);
        }

        if !self.config.do_react {
            return Ok(BurnOutcome::skipped());
        }

        let comm = self.comm.as_ref();
        if !valid_zones_to_burn(&level.state_new, &self.config.limits, comm, self.config.verbose)
        {
            return Ok(BurnOutcome::skipped());
        }

        let rebalance = if self.config.use_custom_knapsack_weights {
            let weights = knapsack_weights(&mut level.knapsack_weights)?;
            let dmap = balanced_distribution(&weights.old, level.state_new.dmap(), comm);
            Some(Rebalance {
                dmap,
                weights: &mut weights.new,
            })
        } else {
            None
        };

        self.announce("Entering burner and doing half-timestep of burning");
        let outcome = burn_with_redistribution(
            &self.kernel(level.layout),
            &level.geom,
            &mut level.state_new,
            &mut level.reactions_new,
            rebalance,
            time,
            dt,
            BurnPhase::SecondHalf,
            0,
            self.diagnostics(),
        )?;
        self.announce("Leaving burner after completing half-timestep of burning");

        let ng = level.state_new.n_grow();
        self.cleaner
            .clean_state(&mut level.state_new, &level.layout, time + 0.5 * dt, ng, comm);

        Ok(outcome)
    }

    /// Burn the full step together with the non-reacting sources
    ///
    /// The new state is rebuilt as `U_old + dt * A` plus the burn for every
    /// eligible cell. Afterwards the new reaction output is copied into
    /// `reactions_old` so both time levels are defined.
    ///
    /// # Errors
    ///
    /// `UnsupportedIntegration` unless simplified SDC is configured;
    /// `LayoutMismatch` when the fields disagree.
    pub fn react_state_sdc(
        &self,
        level: &mut LevelState,
        sources: &dyn SourceProvider,
        time: f64,
        dt: f64,
    ) -> Result<BurnOutcome, ReactError> {
        self.require("react_state_sdc", TimeIntegration::SimplifiedSdc)?;

        let timer = ProfilerScope::new("react_state_sdc");
        level.reactions_new.set_val(0.0);

        if !self.config.do_react {
            level.reactions_old.clone_from(&level.reactions_new);
            return Ok(BurnOutcome::skipped());
        }

        self.announce("Entering burner and doing full timestep of burning");

        let comm = self.comm.as_ref();
        let ng = level.state_new.n_grow();
        let mask = build_interior_boundary_mask(&level.geom, level.grids(), level.dmap(), ng);

        let mut a_src = MultiFab::new(
            level.grids().clone(),
            level.dmap().clone(),
            level.layout.ncomp(),
            ng,
            0.0,
        );
        sources.sum_of_sources(level, time, dt, &mut a_src);

        let kernel = self.kernel(level.layout);
        let report = kernel.react_state_sdc(
            &level.state_old,
            &mut level.state_new,
            &a_src,
            &mut level.reactions_new,
            &mask,
            time,
            dt,
            self.config.sdc_iteration,
            ng,
        )?;

        if ng > 0 {
            level.state_new.fill_boundary(&level.geom);
        }

        let outcome = reduce_burn(
            &report,
            &level.reactions_new,
            &level.layout,
            &timer,
            self.diagnostics(),
            comm,
        );
        self.announce("Leaving burner after completing full timestep of burning");

        self.cleaner
            .clean_state(&mut level.state_new, &level.layout, time + dt, ng, comm);

        level.reactions_old.clone_from(&level.reactions_new);

        Ok(outcome)
    }
}

fn knapsack_weights(
    weights: &mut Option<KnapsackWeights>,
) -> Result<&mut KnapsackWeights, ReactError> {
    weights.as_mut().ok_or_else(|| {
        ReactError::LayoutMismatch(
            "knapsack rebalancing requested but the level carries no weights".to_string(),
        )
    })
}
