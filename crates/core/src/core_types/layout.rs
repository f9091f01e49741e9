//! Component layout of the conserved state vector
//!
//! The state field stores, per cell:
//!
//! | component        | meaning                         |
//! |------------------|---------------------------------|
//! | `RHO`            | density ρ                       |
//! | `MX`, `MY`, `MZ` | momentum density                |
//! | `EDEN`           | total energy density ρE         |
//! | `EINT`           | internal energy density ρe      |
//! | `TEMP`           | temperature T                   |
//! | `first_species..`| species partial densities ρXₖ   |
//! | `first_aux..`    | auxiliary partial densities ρaₖ |
//! | `shock`          | shock flag (optional)           |

use serde::{Deserialize, Serialize};

/// Density
pub const RHO: usize = 0;
/// x momentum density
pub const MX: usize = 1;
/// y momentum density
pub const MY: usize = 2;
/// z momentum density
pub const MZ: usize = 3;
/// Total energy density
pub const EDEN: usize = 4;
/// Internal energy density
pub const EINT: usize = 5;
/// Temperature
pub const TEMP: usize = 6;

const FIRST_SPECIES: usize = 7;

/// Describes how many species and auxiliary scalars the state carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLayout {
    /// Number of reacting species
    pub num_species: usize,
    /// Number of auxiliary advected scalars
    pub num_aux: usize,
    /// Whether a shock-flag component is stored last
    pub has_shock_flag: bool,
}

impl StateLayout {
    /// Layout with species only
    #[must_use]
    pub const fn new(num_species: usize) -> Self {
        Self {
            num_species,
            num_aux: 0,
            has_shock_flag: false,
        }
    }

    /// Add auxiliary scalars
    #[must_use]
    pub const fn with_aux(mut self, num_aux: usize) -> Self {
        self.num_aux = num_aux;
        self
    }

    /// Add a shock-flag component
    #[must_use]
    pub const fn with_shock_flag(mut self) -> Self {
        self.has_shock_flag = true;
        self
    }

    /// Index of species `n`
    #[inline]
    #[must_use]
    pub const fn species(&self, n: usize) -> usize {
        FIRST_SPECIES + n
    }

    /// Index of auxiliary scalar `n`
    #[inline]
    #[must_use]
    pub const fn aux(&self, n: usize) -> usize {
        FIRST_SPECIES + self.num_species + n
    }

    /// Index of the shock flag, if stored
    #[must_use]
    pub const fn shock(&self) -> Option<usize> {
        if self.has_shock_flag {
            Some(FIRST_SPECIES + self.num_species + self.num_aux)
        } else {
            None
        }
    }

    /// Number of state components
    #[must_use]
    pub const fn ncomp(&self) -> usize {
        FIRST_SPECIES + self.num_species + self.num_aux + if self.has_shock_flag { 1 } else { 0 }
    }

    /// Number of reaction-rate components: one per species plus
    /// specific energy release rate and energy-density release rate
    #[must_use]
    pub const fn reaction_ncomp(&self) -> usize {
        self.num_species + 2
    }

    /// Reaction component holding the specific energy release rate
    #[must_use]
    pub const fn reaction_energy(&self) -> usize {
        self.num_species
    }

    /// Reaction component holding the energy-density release rate
    #[must_use]
    pub const fn reaction_rho_energy(&self) -> usize {
        self.num_species + 1
    }
}
