//! Reactive source-term solver
//!
//! This module holds the pieces of a burn call, from the cheap global
//! eligibility check to the consistency repair that finishes it:
//!
//! 1. [`valid_zones_to_burn`] skips the call when no cell can burn
//! 2. [`build_interior_boundary_mask`] marks which ghost cells to burn
//! 3. [`burn_with_redistribution`] optionally moves the state onto a
//!    cost-balanced distribution and back
//! 4. [`BurnKernel`] integrates every eligible cell in parallel
//! 5. [`reduce_burn`] folds failures and diagnostics across ranks
//! 6. a [`StateCleaner`] makes energies and temperature consistent again
//!
//! The reaction network itself is a black box behind [`ReactionNetwork`].

mod burn;
mod clean;
mod limits;
mod mask;
mod network;
pub mod profiler;
mod redistribution;
mod reduce;
mod sources;

// Re-exports
pub use burn::{BurnKernel, BurnPhase, BurnReport};
pub use clean::{GammaLawCleaner, StateCleaner, ATOMIC_MASS_UNIT, K_BOLTZMANN};
pub use limits::{valid_zones_to_burn, ReactLimits};
pub use mask::{build_interior_boundary_mask, BURN, COVERED};
pub use network::{BurnState, ReactionNetwork, SourceForcing};
pub use profiler::ProfilerScope;
pub use redistribution::{balanced_distribution, burn_with_redistribution, Rebalance};
pub use reduce::{reduce_burn, BurnOutcome, Diagnostics};
pub use sources::{SourceProvider, UniformSources, ZeroSources};
