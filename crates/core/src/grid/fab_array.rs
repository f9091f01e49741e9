//! Distributed fields over a level's patches
//!
//! A `FabArray` holds one [`Fab`] per patch of a [`BoxArray`], each allocated
//! over the patch's valid box grown by a fixed ghost width. Ownership of a
//! patch comes from the [`DistributionMap`]; which ranks execute here is the
//! [`Communicator`]'s business.
//!
//! Data movement between patches (halo exchange and the ghost-consistent
//! parallel copy) is done in two phases: a gather pass that packs every
//! transfer into its own buffer, then a scatter pass that writes the buffers
//! into their destination patches.

use super::distribution::DistributionMap;
use super::fab::Fab;
use crate::core_types::{BoxArray, Geometry, IntBox, IntVect};
use crate::error::ReactError;
use crate::parallel::Communicator;
use rayon::prelude::*;

/// Field of real values
pub type MultiFab = FabArray<f64>;

/// Field of integer values
pub type IMultiFab = FabArray<i32>;

/// One region copied from a source patch into a destination patch
#[derive(Debug, Clone, Copy)]
struct Transfer {
    src: usize,
    dst: usize,
    /// Region in destination index space
    region: IntBox,
    /// Destination cell minus source cell
    shift: IntVect,
}

/// Per-level field distributed over patches
#[derive(Debug, Clone)]
pub struct FabArray<T> {
    grids: BoxArray,
    dmap: DistributionMap,
    ncomp: usize,
    ngrow: usize,
    fabs: Vec<Fab<T>>,
}

impl<T: Copy + Send + Sync> FabArray<T> {
    /// Allocate a field with every value set to `value`
    ///
    /// # Panics
    ///
    /// Panics if the distribution map and box array disagree on patch count
    #[must_use]
    pub fn new(
        grids: BoxArray,
        dmap: DistributionMap,
        ncomp: usize,
        ngrow: usize,
        value: T,
    ) -> Self {
        assert_eq!(
            grids.len(),
            dmap.len(),
            "Distribution map must cover every patch"
        );
        let fabs = (0..grids.len())
            .map(|i| Fab::with_value(grids.grown(i, ngrow), ncomp, value))
            .collect();
        Self {
            grids,
            dmap,
            ncomp,
            ngrow,
            fabs,
        }
    }

    /// Allocate a field with the same boxes, components and ghost width on
    /// another distribution map
    #[must_use]
    pub fn mirror_on(&self, dmap: DistributionMap, value: T) -> Self {
        Self::new(self.grids.clone(), dmap, self.ncomp, self.ngrow, value)
    }

    /// Patch boxes
    #[must_use]
    pub fn grids(&self) -> &BoxArray {
        &self.grids
    }

    /// Patch-to-rank assignment
    #[must_use]
    pub fn dmap(&self) -> &DistributionMap {
        &self.dmap
    }

    /// Number of components
    #[must_use]
    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    /// Ghost width
    #[must_use]
    pub fn n_grow(&self) -> usize {
        self.ngrow
    }

    /// Number of patches
    #[must_use]
    pub fn len(&self) -> usize {
        self.fabs.len()
    }

    /// True when the field has no patches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fabs.is_empty()
    }

    /// Patch storage
    #[must_use]
    pub fn fab(&self, patch: usize) -> &Fab<T> {
        &self.fabs[patch]
    }

    /// Mutable patch storage
    pub fn fab_mut(&mut self, patch: usize) -> &mut Fab<T> {
        &mut self.fabs[patch]
    }

    /// All patches
    #[must_use]
    pub fn fabs(&self) -> &[Fab<T>] {
        &self.fabs
    }

    /// All patches, mutably
    pub fn fabs_mut(&mut self) -> &mut [Fab<T>] {
        &mut self.fabs
    }

    /// Whether a patch is owned by a rank executing in this process
    #[must_use]
    pub fn is_local(&self, patch: usize, comm: &dyn Communicator) -> bool {
        comm.is_local(self.dmap.owner(patch))
    }

    /// Set every value (valid and ghost) of every patch
    pub fn set_val(&mut self, value: T) {
        self.fabs.par_iter_mut().for_each(|fab| fab.fill(value));
    }

    /// Copy every value from a field with the identical layout
    pub fn copy_from(&mut self, src: &FabArray<T>) -> Result<(), ReactError> {
        if self.grids != src.grids || self.ncomp != src.ncomp || self.ngrow != src.ngrow {
            return Err(ReactError::LayoutMismatch(
                "copy_from requires identical boxes, components and ghost width".to_string(),
            ));
        }
        self.fabs
            .par_iter_mut()
            .zip(src.fabs.par_iter())
            .for_each(|(dst, src)| dst.as_mut_slice().copy_from_slice(src.as_slice()));
        Ok(())
    }

    /// Ghost-consistent copy from a field on a possibly different assignment
    ///
    /// Every destination cell within `dst_ng` ghost cells of a patch takes
    /// its value from any source patch whose box grown by `src_ng` covers
    /// it. The source must have consistent valid and ghost data. Where
    /// several source patches cover a cell, the source patch with the same
    /// box as the destination patch is written last.
    pub fn parallel_copy_from(
        &mut self,
        src: &FabArray<T>,
        src_ng: usize,
        dst_ng: usize,
    ) -> Result<(), ReactError> {
        if self.ncomp != src.ncomp {
            return Err(ReactError::LayoutMismatch(format!(
                "parallel copy between {} and {} components",
                src.ncomp, self.ncomp
            )));
        }
        if src_ng > src.ngrow || dst_ng > self.ngrow {
            return Err(ReactError::LayoutMismatch(format!(
                "parallel copy ghost widths ({src_ng}, {dst_ng}) exceed allocations ({}, {})",
                src.ngrow, self.ngrow
            )));
        }

        let mut transfers = Vec::new();
        for dst in 0..self.grids.len() {
            let dst_box = self.grids.grown(dst, dst_ng);
            let mut same_box = None;
            for s in 0..src.grids.len() {
                let Some(region) = dst_box.intersect(&src.grids.grown(s, src_ng)) else {
                    continue;
                };
                let transfer = Transfer {
                    src: s,
                    dst,
                    region,
                    shift: [0, 0, 0],
                };
                if src.grids.get(s) == self.grids.get(dst) {
                    same_box = Some(transfer);
                } else {
                    transfers.push(transfer);
                }
            }
            transfers.extend(same_box);
        }

        self.apply_transfers(src, &transfers);
        Ok(())
    }

    /// Halo exchange within the field
    ///
    /// Every ghost cell covered by the valid region of a patch (or of a
    /// periodic image of one) receives that patch's value. Ghost cells not
    /// covered by any valid region keep their values.
    pub fn fill_boundary(&mut self, geom: &Geometry) {
        if self.ngrow == 0 {
            return;
        }
        let transfers = self.halo_transfers(geom);
        let snapshot: Vec<Vec<T>> = self.pack(self, &transfers);
        self.scatter(&transfers, snapshot);
    }

    /// First-order extrapolation into ghost cells beyond non-periodic
    /// domain edges
    ///
    /// Each such ghost cell takes the value of the nearest cell inside the
    /// domain, which always lies in the same patch's allocation.
    pub fn fill_physical_boundary(&mut self, geom: &Geometry) {
        if self.ngrow == 0 {
            return;
        }
        let domain = geom.periodic_grown_domain(self.ngrow, self.grids.dim());
        let ncomp = self.ncomp;
        self.fabs.par_iter_mut().for_each(|fab| {
            let bx = fab.bx();
            for cell in bx.cells().filter(|c| !domain.contains(*c)) {
                let inside: IntVect = std::array::from_fn(|axis| {
                    cell[axis].clamp(domain.lo[axis], domain.hi[axis])
                });
                for comp in 0..ncomp {
                    let value = fab.get(inside, comp);
                    fab.set(cell, comp, value);
                }
            }
        });
    }

    /// Transfers filling this field's ghost cells from valid regions
    fn halo_transfers(&self, geom: &Geometry) -> Vec<Transfer> {
        let dim = self.grids.dim();
        let shifts = geom.periodic_shifts(dim);
        let mut transfers = Vec::new();
        for dst in 0..self.grids.len() {
            let grown = self.grids.grown(dst, self.ngrow);
            for src in 0..self.grids.len() {
                for &shift in &shifts {
                    if src == dst && shift == [0, 0, 0] {
                        continue;
                    }
                    let image = self.grids.get(src).shift(shift);
                    if let Some(region) = grown.intersect(&image) {
                        transfers.push(Transfer {
                            src,
                            dst,
                            region,
                            shift,
                        });
                    }
                }
            }
        }
        transfers
    }

    /// Gather pass: read every transfer's region out of `src`
    fn pack(&self, src: &FabArray<T>, transfers: &[Transfer]) -> Vec<Vec<T>> {
        let ncomp = self.ncomp;
        transfers
            .par_iter()
            .map(|t| {
                let fab = &src.fabs[t.src];
                let mut buffer = Vec::with_capacity(t.region.num_pts() * ncomp);
                for comp in 0..ncomp {
                    for cell in t.region.cells() {
                        let src_cell = [
                            cell[0] - t.shift[0],
                            cell[1] - t.shift[1],
                            cell[2] - t.shift[2],
                        ];
                        buffer.push(fab.get(src_cell, comp));
                    }
                }
                buffer
            })
            .collect()
    }

    /// Scatter pass: write packed buffers into destination patches in order
    fn scatter(&mut self, transfers: &[Transfer], buffers: Vec<Vec<T>>) {
        let mut per_patch: Vec<Vec<(IntBox, Vec<T>)>> = vec![Vec::new(); self.fabs.len()];
        for (t, buffer) in transfers.iter().zip(buffers) {
            per_patch[t.dst].push((t.region, buffer));
        }

        let ncomp = self.ncomp;
        self.fabs
            .par_iter_mut()
            .zip(per_patch.into_par_iter())
            .for_each(|(fab, incoming)| {
                for (region, buffer) in incoming {
                    let npts = region.num_pts();
                    for comp in 0..ncomp {
                        for (offset, cell) in region.cells().enumerate() {
                            fab.set(cell, comp, buffer[comp * npts + offset]);
                        }
                    }
                }
            });
    }

    fn apply_transfers(&mut self, src: &FabArray<T>, transfers: &[Transfer]) {
        let buffers = self.pack(src, transfers);
        self.scatter(transfers, buffers);
    }
}

impl MultiFab {
    /// Minimum of a component over valid cells of local patches
    ///
    /// Returns `f64::INFINITY` when this process owns no cells.
    #[must_use]
    pub fn min_local(&self, comp: usize, comm: &dyn Communicator) -> f64 {
        self.fold_valid_local(comp, comm, f64::INFINITY, f64::min)
    }

    /// Maximum of a component over valid cells of local patches
    ///
    /// Returns `f64::NEG_INFINITY` when this process owns no cells.
    #[must_use]
    pub fn max_local(&self, comp: usize, comm: &dyn Communicator) -> f64 {
        self.fold_valid_local(comp, comm, f64::NEG_INFINITY, f64::max)
    }

    /// Sum of a component over valid cells of local patches
    #[must_use]
    pub fn sum_local(&self, comp: usize, comm: &dyn Communicator) -> f64 {
        self.sum_valid_per_patch(comp, comm).iter().sum()
    }

    /// Global sum of a component over valid cells
    #[must_use]
    pub fn sum(&self, comp: usize, comm: &dyn Communicator) -> f64 {
        let mut total = [self.sum_local(comp, comm)];
        comm.reduce_real_sum(&mut total);
        total[0]
    }

    /// Per-patch sum of a component over valid cells (zero for non-local patches)
    #[must_use]
    pub fn sum_valid_per_patch(&self, comp: usize, comm: &dyn Communicator) -> Vec<f64> {
        self.fabs
            .par_iter()
            .enumerate()
            .map(|(patch, fab)| {
                if !self.is_local(patch, comm) {
                    return 0.0;
                }
                self.grids
                    .get(patch)
                    .cells()
                    .map(|cell| fab.get(cell, comp))
                    .sum()
            })
            .collect()
    }

    fn fold_valid_local(
        &self,
        comp: usize,
        comm: &dyn Communicator,
        identity: f64,
        op: fn(f64, f64) -> f64,
    ) -> f64 {
        self.fabs
            .par_iter()
            .enumerate()
            .filter(|(patch, _)| self.is_local(*patch, comm))
            .map(|(patch, fab)| {
                self.grids
                    .get(patch)
                    .cells()
                    .map(|cell| fab.get(cell, comp))
                    .fold(identity, op)
            })
            .reduce(|| identity, op)
    }
}

impl IMultiFab {
    /// Classify every cell of every patch's grown box
    ///
    /// # Arguments
    ///
    /// * `geom` - Domain and periodicity
    /// * `covered` - Ghost cells covered by the valid region of a patch
    /// * `not_covered` - Ghost cells inside the domain not covered by any patch
    /// * `physical_boundary` - Ghost cells beyond a non-periodic domain edge
    /// * `interior` - Valid cells
    pub fn build_mask(
        &mut self,
        geom: &Geometry,
        covered: i32,
        not_covered: i32,
        physical_boundary: i32,
        interior: i32,
    ) {
        let dim = self.grids.dim();
        let shifts = geom.periodic_shifts(dim);
        let domain = geom.periodic_grown_domain(self.ngrow, dim);
        let grids = &self.grids;
        let ngrow = self.ngrow;

        self.fabs
            .par_iter_mut()
            .enumerate()
            .for_each(|(patch, fab)| {
                let valid = grids.get(patch);
                let grown = grids.grown(patch, ngrow);

                fab.fill(not_covered);
                for cell in grown.cells() {
                    if !domain.contains(cell) {
                        fab.set(cell, 0, physical_boundary);
                    }
                }

                for other in 0..grids.len() {
                    for &shift in &shifts {
                        if other == patch && shift == [0, 0, 0] {
                            continue;
                        }
                        if let Some(region) = grown.intersect(&grids.get(other).shift(shift)) {
                            fab.fill_region(&region, 0, covered);
                        }
                    }
                }

                fab.fill_region(&valid, 0, interior);
            });
    }
}
