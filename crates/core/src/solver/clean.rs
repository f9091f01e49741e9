//! Post-burn thermodynamic consistency
//!
//! After a burn the internal energy, total energy and temperature of a cell
//! must agree again. The engine calls a [`StateCleaner`] on the updated
//! state; [`GammaLawCleaner`] is a provided implementation for an ideal gas.

use crate::core_types::layout::{EDEN, EINT, MX, MY, MZ, RHO, TEMP};
use crate::core_types::StateLayout;
use crate::grid::MultiFab;
use crate::parallel::Communicator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Boltzmann constant (erg/K)
pub const K_BOLTZMANN: f64 = 1.380649e-16;

/// Atomic mass unit (g)
pub const ATOMIC_MASS_UNIT: f64 = 1.66053906660e-24;

/// Repairs internal energy, total energy and temperature after a burn
pub trait StateCleaner: Send + Sync {
    /// Make the state of local patches consistent over their valid cells
    /// grown by `ng`
    fn clean_state(
        &self,
        state: &mut MultiFab,
        layout: &StateLayout,
        time: f64,
        ng: usize,
        comm: &dyn Communicator,
    );
}

/// Ideal-gas repair with a dual-energy switch
///
/// Where `rhoE - kinetic` exceeds `eta2 * rhoE` the internal energy is
/// taken from the total energy; otherwise the evolved internal energy is
/// kept. Temperature is then recomputed from the internal energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaLawCleaner {
    /// Ratio of specific heats
    pub gamma: f64,
    /// Mean molecular weight
    pub mean_molecular_weight: f64,
    /// Dual-energy switch parameter
    pub eta2: f64,
    /// Temperature floor
    pub small_temp: f64,
}

impl Default for GammaLawCleaner {
    fn default() -> Self {
        Self {
            gamma: 5.0 / 3.0,
            mean_molecular_weight: 12.0 / 7.0,
            eta2: 1.0e-4,
            small_temp: 1.0e5,
        }
    }
}

impl GammaLawCleaner {
    /// Specific internal energy at temperature `t`
    #[must_use]
    pub fn e_from_temperature(&self, t: f64) -> f64 {
        K_BOLTZMANN * t / ((self.gamma - 1.0) * self.mean_molecular_weight * ATOMIC_MASS_UNIT)
    }

    /// Temperature for specific internal energy `e`
    #[must_use]
    pub fn temperature_from_e(&self, e: f64) -> f64 {
        (self.gamma - 1.0) * e * self.mean_molecular_weight * ATOMIC_MASS_UNIT / K_BOLTZMANN
    }

    /// Internal energy density for a cell at density `rho`, temperature `t`
    #[must_use]
    pub fn rho_e_from_temperature(&self, rho: f64, t: f64) -> f64 {
        rho * self.e_from_temperature(t)
    }
}

impl StateCleaner for GammaLawCleaner {
    fn clean_state(
        &self,
        state: &mut MultiFab,
        _layout: &StateLayout,
        _time: f64,
        ng: usize,
        comm: &dyn Communicator,
    ) {
        let ng = ng.min(state.n_grow());
        let grids = state.grids().clone();
        let owners = state.dmap().owners().to_vec();
        let e_floor = self.e_from_temperature(self.small_temp);

        state
            .fabs_mut()
            .par_iter_mut()
            .enumerate()
            .filter(|(patch, _)| comm.is_local(owners[*patch]))
            .for_each(|(patch, fab)| {
                for cell in grids.grown(patch, ng).cells() {
                    let rho = fab.get(cell, RHO);
                    if rho <= 0.0 {
                        continue;
                    }
                    let kinetic = 0.5
                        * (fab.get(cell, MX).powi(2)
                            + fab.get(cell, MY).powi(2)
                            + fab.get(cell, MZ).powi(2))
                        / rho;
                    let rho_big_e = fab.get(cell, EDEN);
                    let mut rho_e = fab.get(cell, EINT);

                    let rho_e_from_total = rho_big_e - kinetic;
                    if rho_e_from_total > self.eta2 * rho_big_e {
                        rho_e = rho_e_from_total;
                    }

                    if rho_e < rho * e_floor {
                        rho_e = rho * e_floor;
                        fab.set(cell, EDEN, rho_e + kinetic);
                    }

                    fab.set(cell, EINT, rho_e);
                    fab.set(cell, TEMP, self.temperature_from_e(rho_e / rho));
                }
            });
    }
}
