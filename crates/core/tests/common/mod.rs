//! Shared fixtures for the integration tests: tracing setup, mock
//! reaction networks and level builders.

#![allow(dead_code)]

use burn_sim_core::core_types::layout::{EDEN, EINT, RHO, TEMP};
use burn_sim_core::{
    BoxArray, BurnState, DistributionMap, Fab, GammaLawCleaner, Geometry, GhostWidths, HostedRanks,
    IntBox, IntVect, LevelState, MultiFab, ReactConfig, ReactionNetwork, Reactor, StateLayout,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two species, no auxiliary scalars
pub fn layout() -> StateLayout {
    StateLayout::new(2)
}

pub fn eos() -> GammaLawCleaner {
    GammaLawCleaner::default()
}

/// Leaves the composition alone and releases no energy
pub struct NoOpNetwork;

impl ReactionNetwork for NoOpNetwork {
    fn num_species(&self) -> usize {
        2
    }

    fn burn(&self, state: &mut BurnState, _dt: f64) {
        state.n_rhs = 1;
    }
}

/// Moves `fraction` of species 0 into species 1 and releases `q` per unit
/// mass fraction converted
pub struct ConversionNetwork {
    pub fraction: f64,
    pub q: f64,
}

impl Default for ConversionNetwork {
    fn default() -> Self {
        Self {
            fraction: 0.5,
            q: 1.0e17,
        }
    }
}

impl ConversionNetwork {
    fn convert(&self, state: &mut BurnState) {
        let moved = self.fraction * state.xn[0];
        state.xn[0] -= moved;
        state.xn[1] += moved;
        state.e = self.q * moved;
        state.n_rhs = 4;
        state.n_jac = 1;
    }
}

impl ReactionNetwork for ConversionNetwork {
    fn num_species(&self) -> usize {
        2
    }

    fn burn(&self, state: &mut BurnState, _dt: f64) {
        self.convert(state);
    }
}

/// Converts like [`ConversionNetwork`] but reports failure for cells at
/// `fail_temperature`
pub struct FailingCellNetwork {
    pub inner: ConversionNetwork,
    pub fail_temperature: f64,
}

impl ReactionNetwork for FailingCellNetwork {
    fn num_species(&self) -> usize {
        2
    }

    fn burn(&self, state: &mut BurnState, _dt: f64) {
        self.inner.convert(state);
        if (state.t - self.fail_temperature).abs() < 1.0 {
            state.success = false;
        }
    }
}

/// Leaves the species alone and scales the single auxiliary fraction by
/// `factor`
pub struct AuxDecayNetwork {
    pub factor: f64,
}

impl ReactionNetwork for AuxDecayNetwork {
    fn num_species(&self) -> usize {
        2
    }

    fn num_aux(&self) -> usize {
        1
    }

    fn burn(&self, state: &mut BurnState, _dt: f64) {
        state.aux[0] *= self.factor;
        state.n_rhs = 1;
    }
}

/// Reports 10 RHS and 2 Jacobian evaluations above `hot_temperature`,
/// one RHS evaluation otherwise
pub struct IterationCountNetwork {
    pub hot_temperature: f64,
}

impl ReactionNetwork for IterationCountNetwork {
    fn num_species(&self) -> usize {
        2
    }

    fn burn(&self, state: &mut BurnState, _dt: f64) {
        if state.t > self.hot_temperature {
            state.n_rhs = 10;
            state.n_jac = 2;
        } else {
            state.n_rhs = 1;
            state.n_jac = 0;
        }
    }
}

/// Counts how many cells it was asked to burn
#[derive(Default, Clone)]
pub struct CountingNetwork {
    pub calls: Arc<AtomicUsize>,
}

impl CountingNetwork {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReactionNetwork for CountingNetwork {
    fn num_species(&self) -> usize {
        2
    }

    fn burn(&self, _state: &mut BurnState, _dt: f64) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reactor hosting every rank of an `n_ranks` run
pub fn reactor<N: ReactionNetwork + 'static>(
    config: ReactConfig,
    network: N,
    n_ranks: usize,
) -> Reactor {
    Reactor::new(
        config,
        Box::new(network),
        Box::new(eos()),
        Box::new(HostedRanks::all(n_ranks)),
    )
}

/// Level over `0..nx` by `0..ny` chopped into `max_size` patches, dealt
/// round-robin over `n_ranks`
pub fn level_2d(
    nx: i32,
    ny: i32,
    max_size: usize,
    n_ranks: usize,
    periodic: [bool; 3],
    ghosts: GhostWidths,
) -> LevelState {
    let domain = IntBox::new([0, 0, 0], [nx - 1, ny - 1, 0]);
    let grids = BoxArray::chop(domain, max_size, 2);
    let dmap = DistributionMap::round_robin(grids.len(), n_ranks);
    LevelState::new(
        Geometry::with_periodicity(domain, periodic),
        &grids,
        &dmap,
        layout(),
        ghosts,
    )
}

/// Level over `0..nx` in one dimension
pub fn level_1d(nx: i32, max_size: usize, n_ranks: usize, ghosts: GhostWidths) -> LevelState {
    let domain = IntBox::new([0, 0, 0], [nx - 1, 0, 0]);
    let grids = BoxArray::chop(domain, max_size, 1);
    let dmap = DistributionMap::round_robin(grids.len(), n_ranks);
    LevelState::new(Geometry::new(domain), &grids, &dmap, layout(), ghosts)
}

pub fn no_ghosts() -> GhostWidths {
    GhostWidths {
        state: 0,
        border: 0,
        reactions: 0,
    }
}

/// Write a gas at rest with density, temperature and composition into a cell
pub fn set_cell(fab: &mut Fab<f64>, cell: IntVect, rho: f64, t: f64, xn: &[f64]) {
    let layout = layout();
    let rho_e = eos().rho_e_from_temperature(rho, t);
    fab.set(cell, RHO, rho);
    fab.set(cell, TEMP, t);
    fab.set(cell, EINT, rho_e);
    fab.set(cell, EDEN, rho_e);
    for (n, x) in xn.iter().enumerate() {
        fab.set(cell, layout.species(n), rho * x);
    }
}

/// Fill every allocated cell (valid and ghost) from a cell-wise recipe
pub fn fill_with<F>(field: &mut MultiFab, recipe: F)
where
    F: Fn(IntVect) -> (f64, f64, Vec<f64>),
{
    for fab in field.fabs_mut() {
        let bx = fab.bx();
        for cell in bx.cells() {
            let (rho, t, xn) = recipe(cell);
            set_cell(fab, cell, rho, t, &xn);
        }
    }
}

/// Fill every allocated cell with the same gas
pub fn fill_uniform(field: &mut MultiFab, rho: f64, t: f64, xn: &[f64]) {
    fill_with(field, |_| (rho, t, xn.to_vec()));
}

/// Every value of every patch, in patch order
pub fn all_values(field: &MultiFab) -> Vec<f64> {
    field
        .fabs()
        .iter()
        .flat_map(|fab| fab.as_slice().iter().copied())
        .collect()
}

/// Value of a component at a cell wherever a patch's valid box holds it
pub fn valid_value(field: &MultiFab, cell: IntVect, comp: usize) -> f64 {
    let patch = (0..field.len())
        .find(|&p| field.grids().get(p).contains(cell))
        .expect("cell outside every patch");
    field.fab(patch).get(cell, comp)
}
