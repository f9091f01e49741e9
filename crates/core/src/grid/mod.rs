//! Distributed grid storage
//!
//! Patches, per-level field arrays, and the assignment of patches to ranks.

pub mod distribution;
pub mod fab;
pub mod fab_array;

// Re-export main types
pub use distribution::DistributionMap;
pub use fab::Fab;
pub use fab_array::{FabArray, IMultiFab, MultiFab};
