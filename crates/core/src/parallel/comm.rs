//! Communicator abstraction and the in-process implementation

use rustc_hash::FxHashSet;

/// Collective operations across compute ranks
///
/// Every rank of a run calls each collective in the same order. Values
/// passed in are this process's partial results (already folded over every
/// rank it hosts); on return they hold the global result.
pub trait Communicator: Send + Sync {
    /// Total number of ranks in the run
    fn n_ranks(&self) -> usize;

    /// Whether this process executes the given rank's patches
    fn is_local(&self, rank: usize) -> bool;

    /// Whether this process prints run-level diagnostics
    fn is_io_process(&self) -> bool {
        self.is_local(0)
    }

    /// Element-wise global minimum
    fn reduce_real_min(&self, values: &mut [f64]);

    /// Element-wise global maximum
    fn reduce_real_max(&self, values: &mut [f64]);

    /// Element-wise global sum
    fn reduce_real_sum(&self, values: &mut [f64]);

    /// Global minimum of an integer
    fn reduce_int_min(&self, value: i32) -> i32;
}

/// A process that hosts a set of logical ranks
///
/// With every rank hosted, the address space holds the whole run and the
/// reductions are identities. Hosting a subset restricts the burn to that
/// subset's patches, which is how a single rank of a larger run behaves.
#[derive(Debug, Clone)]
pub struct HostedRanks {
    n_ranks: usize,
    local: Option<FxHashSet<usize>>,
}

impl HostedRanks {
    /// Host all `n_ranks` ranks in this process
    #[must_use]
    pub fn all(n_ranks: usize) -> Self {
        Self {
            n_ranks: n_ranks.max(1),
            local: None,
        }
    }

    /// Single-rank run
    #[must_use]
    pub fn serial() -> Self {
        Self::all(1)
    }

    /// Host only the listed ranks of an `n_ranks` run
    #[must_use]
    pub fn subset(n_ranks: usize, ranks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            n_ranks: n_ranks.max(1),
            local: Some(ranks.into_iter().filter(|&r| r < n_ranks).collect()),
        }
    }
}

impl Communicator for HostedRanks {
    fn n_ranks(&self) -> usize {
        self.n_ranks
    }

    fn is_local(&self, rank: usize) -> bool {
        match &self.local {
            None => rank < self.n_ranks,
            Some(set) => set.contains(&rank),
        }
    }

    fn reduce_real_min(&self, _values: &mut [f64]) {}

    fn reduce_real_max(&self, _values: &mut [f64]) {}

    fn reduce_real_sum(&self, _values: &mut [f64]) {}

    fn reduce_int_min(&self, value: i32) -> i32 {
        value
    }
}
