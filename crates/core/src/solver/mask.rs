//! Interior/boundary burn mask
//!
//! Burning is expensive, so ghost cells that a later halo exchange will
//! overwrite with a neighbor's valid data are masked out. Ghost cells that
//! no neighbor covers (coarse-fine interfaces and domain boundaries) are
//! burned directly, since nothing else will fill them.

use crate::core_types::{BoxArray, Geometry};
use crate::grid::{DistributionMap, IMultiFab};

/// Mask value marking a cell to burn
pub const BURN: i32 = 1;

/// Mask value marking a ghost cell covered by another patch's valid region
pub const COVERED: i32 = 0;

/// Build the burn mask for a level with ghost width `ng`
///
/// The mask is only meaningful on the distribution map it was built on.
#[must_use]
pub fn build_interior_boundary_mask(
    geom: &Geometry,
    grids: &BoxArray,
    dmap: &DistributionMap,
    ng: usize,
) -> IMultiFab {
    let mut mask = IMultiFab::new(grids.clone(), dmap.clone(), 1, ng, BURN);
    mask.build_mask(geom, COVERED, BURN, BURN, BURN);
    mask
}
