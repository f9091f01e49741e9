//! Cross-rank communication
//!
//! The engine only needs collective reductions; data movement between
//! patches happens through the shared field storage.

mod comm;

pub use comm::{Communicator, HostedRanks};
