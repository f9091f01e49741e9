//! Reaction network contract
//!
//! The engine treats the reaction network as a black box. It hands the
//! network a [`BurnState`] built from one cell and reads back the updated
//! composition, the specific energy released, the success flag and the
//! iteration counters.

/// Per-cell input and output of the reaction network
///
/// Created fresh for each cell and discarded after the cell update.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnState {
    /// Density
    pub rho: f64,
    /// Temperature
    pub t: f64,
    /// Specific energy released by the burn (output)
    pub e: f64,
    /// Species mass fractions
    pub xn: Vec<f64>,
    /// Auxiliary mass fractions
    pub aux: Vec<f64>,
    /// Whether the integration converged (output)
    pub success: bool,
    /// Right-hand-side evaluations used (output)
    pub n_rhs: u32,
    /// Jacobian evaluations used (output)
    pub n_jac: u32,
}

impl BurnState {
    /// Fresh state with no energy released and zeroed counters
    #[must_use]
    pub fn new(rho: f64, t: f64, xn: Vec<f64>, aux: Vec<f64>) -> Self {
        Self {
            rho,
            t,
            e: 0.0,
            xn,
            aux,
            success: true,
            n_rhs: 0,
            n_jac: 0,
        }
    }

    /// Relative integration cost of this burn, never below 1
    #[must_use]
    pub fn cost_weight(&self) -> f64 {
        (f64::from(self.n_rhs) + 2.0 * f64::from(self.n_jac)).max(1.0)
    }
}

/// Non-reacting rates of change applied alongside the burn in the coupled
/// full-step mode
///
/// Species and auxiliary entries are rates of partial density.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceForcing {
    /// Density rate
    pub rho: f64,
    /// Internal energy density rate
    pub rho_e: f64,
    /// Species partial density rates
    pub species: Vec<f64>,
    /// Auxiliary partial density rates
    pub aux: Vec<f64>,
    /// Deferred-correction iteration the forcing belongs to
    pub iteration: u32,
}

impl SourceForcing {
    /// Apply the forcing to a state as a constant advance over `dt`
    ///
    /// Density and composition are advanced; energy and temperature are
    /// left to the caller.
    pub fn advance(&self, state: &mut BurnState, dt: f64) {
        let rho_old = state.rho;
        let rho_new = rho_old + dt * self.rho;
        for (x, rate) in state.xn.iter_mut().zip(&self.species) {
            *x = (rho_old * *x + dt * rate) / rho_new;
        }
        for (a, rate) in state.aux.iter_mut().zip(&self.aux) {
            *a = (rho_old * *a + dt * rate) / rho_new;
        }
        state.rho = rho_new;
    }
}

/// Local reaction integrator
///
/// Implementations must be usable from many threads at once; each call
/// only touches the state it is given.
pub trait ReactionNetwork: Send + Sync {
    /// Number of species the network evolves
    fn num_species(&self) -> usize;

    /// Number of auxiliary scalars carried alongside the species
    fn num_aux(&self) -> usize {
        0
    }

    /// Integrate the reactions in `state` for `dt`
    ///
    /// On return `state.xn`/`state.aux` hold the new fractions, `state.e`
    /// the specific energy released, and `state.success`, `state.n_rhs`,
    /// `state.n_jac` describe the integration.
    fn burn(&self, state: &mut BurnState, dt: f64);

    /// Integrate reactions together with non-reacting sources for `dt`
    ///
    /// The default advances the state by the forcing first and then
    /// burns; networks that can integrate both at once override this.
    fn burn_with_sources(&self, state: &mut BurnState, forcing: &SourceForcing, dt: f64) {
        forcing.advance(state, dt);
        self.burn(state, dt);
    }
}
