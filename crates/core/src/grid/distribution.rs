//! Assignment of patches to compute ranks
//!
//! The default assignment is supplied by the caller. The cost-balanced
//! assignment is a greedy knapsack: patches sorted by descending weight are
//! each handed to the currently least-loaded rank. Patches are never split.

use super::fab_array::MultiFab;
use crate::error::ReactError;
use crate::parallel::Communicator;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::debug;

/// Mapping from patch index to owning rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionMap {
    owners: Vec<usize>,
    n_ranks: usize,
}

/// Accumulated load of one rank, ordered by load then rank index
#[derive(Debug, Clone, Copy)]
struct RankLoad {
    load: f64,
    rank: usize,
}

impl PartialEq for RankLoad {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankLoad {}

impl PartialOrd for RankLoad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankLoad {
    fn cmp(&self, other: &Self) -> Ordering {
        self.load
            .total_cmp(&other.load)
            .then(self.rank.cmp(&other.rank))
    }
}

impl DistributionMap {
    /// Create a map from explicit owners
    ///
    /// # Panics
    ///
    /// Panics if an owner is not a valid rank
    #[must_use]
    pub fn new(owners: Vec<usize>, n_ranks: usize) -> Self {
        assert!(
            owners.iter().all(|&r| r < n_ranks),
            "Owner rank out of range"
        );
        Self { owners, n_ranks }
    }

    /// Deal patches to ranks in turn
    #[must_use]
    pub fn round_robin(n_boxes: usize, n_ranks: usize) -> Self {
        let n_ranks = n_ranks.max(1);
        Self {
            owners: (0..n_boxes).map(|i| i % n_ranks).collect(),
            n_ranks,
        }
    }

    /// Cost-balanced assignment of weighted patches
    ///
    /// # Arguments
    ///
    /// * `weights` - Aggregate cost of each patch
    /// * `n_ranks` - Number of ranks to balance over
    ///
    /// # Returns
    ///
    /// A map in which every patch appears exactly once, or
    /// `ReactError::InvalidPartition` when there is nothing usable to balance
    pub fn knapsack(weights: &[f64], n_ranks: usize) -> Result<Self, ReactError> {
        if weights.is_empty() {
            return Err(ReactError::InvalidPartition(
                "no patches to distribute".to_string(),
            ));
        }
        if n_ranks == 0 {
            return Err(ReactError::InvalidPartition(
                "cannot distribute over zero ranks".to_string(),
            ));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ReactError::InvalidPartition(format!(
                "patch weight {bad} is not a finite non-negative cost"
            )));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ReactError::InvalidPartition(
                "no weight data recorded".to_string(),
            ));
        }

        // Heaviest first; ties keep patch order so the result is deterministic
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then(a.cmp(&b)));

        let mut heap: BinaryHeap<Reverse<RankLoad>> = (0..n_ranks)
            .map(|rank| Reverse(RankLoad { load: 0.0, rank }))
            .collect();

        let mut owners = vec![0; weights.len()];
        for patch in order {
            let Some(Reverse(mut lightest)) = heap.pop() else {
                unreachable!("heap holds one entry per rank");
            };
            owners[patch] = lightest.rank;
            lightest.load += weights[patch];
            heap.push(Reverse(lightest));
        }

        Ok(Self { owners, n_ranks })
    }

    /// Cost-balanced assignment from a per-cell weight field
    ///
    /// Each patch's cost is the sum of its valid-cell weights. Per-patch
    /// totals are summed across ranks before partitioning.
    pub fn from_weight_field(
        weights: &MultiFab,
        comm: &dyn Communicator,
    ) -> Result<Self, ReactError> {
        let mut patch_weights = weights.sum_valid_per_patch(0, comm);
        comm.reduce_real_sum(&mut patch_weights);

        let map = Self::knapsack(&patch_weights, comm.n_ranks())?;
        debug!(
            "Knapsack distribution over {} ranks: efficiency {:.3}",
            map.n_ranks,
            map.efficiency(&patch_weights)
        );
        Ok(map)
    }

    /// Owner of a patch
    #[inline]
    #[must_use]
    pub fn owner(&self, patch: usize) -> usize {
        self.owners[patch]
    }

    /// Number of patches
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True when the map has no patches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Number of ranks
    #[must_use]
    pub fn n_ranks(&self) -> usize {
        self.n_ranks
    }

    /// Owners in patch order
    #[must_use]
    pub fn owners(&self) -> &[usize] {
        &self.owners
    }

    /// Summed patch weight per rank
    #[must_use]
    pub fn load_per_rank(&self, weights: &[f64]) -> Vec<f64> {
        let mut loads = vec![0.0; self.n_ranks];
        for (patch, &w) in weights.iter().enumerate().take(self.owners.len()) {
            loads[self.owners[patch]] += w;
        }
        loads
    }

    /// Mean rank load divided by the maximum rank load (1.0 is perfect)
    #[must_use]
    pub fn efficiency(&self, weights: &[f64]) -> f64 {
        let loads = self.load_per_rank(weights);
        let max = loads.iter().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return 1.0;
        }
        let mean = loads.iter().sum::<f64>() / loads.len() as f64;
        mean / max
    }
}
