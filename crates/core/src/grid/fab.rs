//! Per-patch field storage
//!
//! A `Fab` stores every component of a field over one patch's allocated
//! (ghost-grown) box as a flat `Vec<T>` in component-major order: all cells
//! of component 0, then all cells of component 1, and so on. Within a
//! component the i index varies fastest.

use crate::core_types::{IntBox, IntVect};

/// Field data container for a single patch
#[derive(Debug, Clone, PartialEq)]
pub struct Fab<T> {
    bx: IntBox,
    ncomp: usize,
    data: Vec<T>,
}

impl<T: Copy> Fab<T> {
    /// Create a new patch over `bx` with every value set to `value`
    ///
    /// # Arguments
    ///
    /// * `bx` - Allocated box (valid region grown by ghost cells)
    /// * `ncomp` - Number of components
    /// * `value` - Initial value for all cells and components
    #[must_use]
    pub fn with_value(bx: IntBox, ncomp: usize, value: T) -> Self {
        Self {
            bx,
            ncomp,
            data: vec![value; bx.num_pts() * ncomp],
        }
    }

    /// Allocated box
    #[must_use]
    pub fn bx(&self) -> IntBox {
        self.bx
    }

    /// Number of components
    #[must_use]
    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    /// Check whether a cell lies in the allocated extent
    #[inline]
    #[must_use]
    pub fn contains(&self, cell: IntVect) -> bool {
        self.bx.contains(cell)
    }

    #[inline]
    fn index(&self, cell: IntVect, comp: usize) -> usize {
        debug_assert!(self.bx.contains(cell), "Cell {cell:?} outside {:?}", self.bx);
        debug_assert!(comp < self.ncomp, "Component {comp} out of range");
        comp * self.bx.num_pts() + self.bx.offset(cell)
    }

    /// Get value at a cell
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the allocated box
    #[inline]
    #[must_use]
    pub fn get(&self, cell: IntVect, comp: usize) -> T {
        assert!(self.bx.contains(cell), "Coordinates out of bounds");
        self.data[self.index(cell, comp)]
    }

    /// Set value at a cell
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the allocated box
    #[inline]
    pub fn set(&mut self, cell: IntVect, comp: usize, value: T) {
        assert!(self.bx.contains(cell), "Coordinates out of bounds");
        let idx = self.index(cell, comp);
        self.data[idx] = value;
    }

    /// Gather every component of one cell into `out`
    pub fn read_cell(&self, cell: IntVect, out: &mut [T]) {
        let npts = self.bx.num_pts();
        let offset = self.bx.offset(cell);
        for (comp, slot) in out.iter_mut().enumerate().take(self.ncomp) {
            *slot = self.data[comp * npts + offset];
        }
    }

    /// Scatter every component of one cell from `values`
    pub fn write_cell(&mut self, cell: IntVect, values: &[T]) {
        let npts = self.bx.num_pts();
        let offset = self.bx.offset(cell);
        for (comp, &value) in values.iter().enumerate().take(self.ncomp) {
            self.data[comp * npts + offset] = value;
        }
    }

    /// Fill every component of every cell with a value
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Fill one component over a region (clipped to the allocated box)
    pub fn fill_region(&mut self, region: &IntBox, comp: usize, value: T) {
        if let Some(isect) = self.bx.intersect(region) {
            for cell in isect.cells() {
                self.set(cell, comp, value);
            }
        }
    }

    /// Raw component-major values
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Raw mutable component-major values
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}
