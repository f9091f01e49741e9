//! Index-space geometry for block-structured grids
//!
//! Cells are addressed by integer triples. A patch covers an axis-aligned
//! inclusive box of cells; a `BoxArray` is the ordered list of patch boxes
//! on one level, and `Geometry` describes the problem domain and which axes
//! wrap around periodically.

use serde::{Deserialize, Serialize};

/// Integer cell coordinate `[i, j, k]`
pub type IntVect = [i32; 3];

/// Axis-aligned box of cells with inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntBox {
    /// Lower corner (inclusive)
    pub lo: IntVect,
    /// Upper corner (inclusive)
    pub hi: IntVect,
}

impl IntBox {
    /// Create a box from its inclusive corners
    #[must_use]
    pub const fn new(lo: IntVect, hi: IntVect) -> Self {
        Self { lo, hi }
    }

    /// Extent along one axis (zero for an empty box)
    #[must_use]
    pub fn length(&self, axis: usize) -> usize {
        (self.hi[axis] - self.lo[axis] + 1).max(0) as usize
    }

    /// Number of cells in the box
    #[must_use]
    pub fn num_pts(&self) -> usize {
        self.length(0) * self.length(1) * self.length(2)
    }

    /// True when the box holds no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|d| self.hi[d] < self.lo[d])
    }

    /// Check whether a cell lies in the box
    #[must_use]
    pub fn contains(&self, cell: IntVect) -> bool {
        (0..3).all(|d| cell[d] >= self.lo[d] && cell[d] <= self.hi[d])
    }

    /// Check whether another box lies entirely inside this one
    #[must_use]
    pub fn contains_box(&self, other: &IntBox) -> bool {
        other.is_empty() || (self.contains(other.lo) && self.contains(other.hi))
    }

    /// Intersection of two boxes, `None` when they do not overlap
    #[must_use]
    pub fn intersect(&self, other: &IntBox) -> Option<IntBox> {
        let mut lo = [0; 3];
        let mut hi = [0; 3];
        for d in 0..3 {
            lo[d] = self.lo[d].max(other.lo[d]);
            hi[d] = self.hi[d].min(other.hi[d]);
            if hi[d] < lo[d] {
                return None;
            }
        }
        Some(IntBox { lo, hi })
    }

    /// Grow the box by `ng` cells on both sides of the first `dim` axes
    #[must_use]
    pub fn grow(&self, ng: usize, dim: usize) -> IntBox {
        let mut grown = *self;
        let ng = ng as i32;
        for d in 0..dim.min(3) {
            grown.lo[d] -= ng;
            grown.hi[d] += ng;
        }
        grown
    }

    /// Translate the box by an offset
    #[must_use]
    pub fn shift(&self, offset: IntVect) -> IntBox {
        IntBox {
            lo: [
                self.lo[0] + offset[0],
                self.lo[1] + offset[1],
                self.lo[2] + offset[2],
            ],
            hi: [
                self.hi[0] + offset[0],
                self.hi[1] + offset[1],
                self.hi[2] + offset[2],
            ],
        }
    }

    /// Linear offset of a cell inside the box (i fastest)
    ///
    /// The cell must lie in the box.
    #[inline]
    #[must_use]
    pub fn offset(&self, cell: IntVect) -> usize {
        let i = (cell[0] - self.lo[0]) as usize;
        let j = (cell[1] - self.lo[1]) as usize;
        let k = (cell[2] - self.lo[2]) as usize;
        (k * self.length(1) + j) * self.length(0) + i
    }

    /// Cell at a linear offset (inverse of [`IntBox::offset`])
    #[inline]
    #[must_use]
    pub fn cell_at(&self, offset: usize) -> IntVect {
        let nx = self.length(0);
        let ny = self.length(1);
        let i = offset % nx;
        let j = (offset / nx) % ny;
        let k = offset / (nx * ny);
        [
            self.lo[0] + i as i32,
            self.lo[1] + j as i32,
            self.lo[2] + k as i32,
        ]
    }

    /// Iterate over every cell of the box, i fastest
    pub fn cells(&self) -> impl Iterator<Item = IntVect> + '_ {
        let n = if self.is_empty() { 0 } else { self.num_pts() };
        (0..n).map(move |idx| self.cell_at(idx))
    }
}

/// Ordered list of patch boxes on one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxArray {
    boxes: Vec<IntBox>,
    dim: usize,
}

impl BoxArray {
    /// Create a box array of spatial dimension `dim` (1, 2 or 3)
    #[must_use]
    pub fn new(boxes: Vec<IntBox>, dim: usize) -> Self {
        Self {
            boxes,
            dim: dim.clamp(1, 3),
        }
    }

    /// Chop a domain into patches of at most `max_size` cells per axis
    ///
    /// Patches are ordered with the i index varying fastest.
    #[must_use]
    pub fn chop(domain: IntBox, max_size: usize, dim: usize) -> Self {
        let dim = dim.clamp(1, 3);
        let max_size = max_size.max(1) as i32;
        let mut starts: [Vec<(i32, i32)>; 3] = Default::default();
        for d in 0..3 {
            if d < dim {
                let mut lo = domain.lo[d];
                while lo <= domain.hi[d] {
                    let hi = (lo + max_size - 1).min(domain.hi[d]);
                    starts[d].push((lo, hi));
                    lo = hi + 1;
                }
            } else {
                starts[d].push((domain.lo[d], domain.hi[d]));
            }
        }

        let mut boxes = Vec::new();
        for &(klo, khi) in &starts[2] {
            for &(jlo, jhi) in &starts[1] {
                for &(ilo, ihi) in &starts[0] {
                    boxes.push(IntBox::new([ilo, jlo, klo], [ihi, jhi, khi]));
                }
            }
        }
        Self { boxes, dim }
    }

    /// Number of patches
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// True when the array has no patches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Spatial dimension
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Valid box of a patch
    #[must_use]
    pub fn get(&self, index: usize) -> IntBox {
        self.boxes[index]
    }

    /// Valid box of a patch grown by `ng` ghost cells
    #[must_use]
    pub fn grown(&self, index: usize, ng: usize) -> IntBox {
        self.boxes[index].grow(ng, self.dim)
    }

    /// Iterate over valid boxes
    pub fn iter(&self) -> impl Iterator<Item = &IntBox> {
        self.boxes.iter()
    }

    /// Total number of valid cells
    #[must_use]
    pub fn num_pts(&self) -> usize {
        self.boxes.iter().map(IntBox::num_pts).sum()
    }
}

/// Problem domain and periodicity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Domain box in cell indices
    pub domain: IntBox,
    /// Periodicity flag per axis
    pub is_periodic: [bool; 3],
}

impl Geometry {
    /// Non-periodic geometry over a domain
    #[must_use]
    pub fn new(domain: IntBox) -> Self {
        Self {
            domain,
            is_periodic: [false; 3],
        }
    }

    /// Geometry with the given periodic axes
    #[must_use]
    pub fn with_periodicity(domain: IntBox, is_periodic: [bool; 3]) -> Self {
        Self {
            domain,
            is_periodic,
        }
    }

    /// Offsets under which a patch has a periodic image
    ///
    /// Always includes the zero shift first.
    #[must_use]
    pub fn periodic_shifts(&self, dim: usize) -> Vec<IntVect> {
        let mut choices: [Vec<i32>; 3] = [vec![0], vec![0], vec![0]];
        for d in 0..dim.min(3) {
            if self.is_periodic[d] {
                let period = self.domain.length(d) as i32;
                choices[d] = vec![0, -period, period];
            }
        }

        let mut shifts = Vec::new();
        for &sk in &choices[2] {
            for &sj in &choices[1] {
                for &si in &choices[0] {
                    shifts.push([si, sj, sk]);
                }
            }
        }
        shifts
    }

    /// Domain grown through the periodic axes by `ng` cells
    ///
    /// Cells outside this box are beyond a physical (non-periodic) boundary.
    #[must_use]
    pub fn periodic_grown_domain(&self, ng: usize, dim: usize) -> IntBox {
        let mut bx = self.domain;
        for d in 0..dim.min(3) {
            if self.is_periodic[d] {
                bx.lo[d] -= ng as i32;
                bx.hi[d] += ng as i32;
            }
        }
        bx
    }
}
