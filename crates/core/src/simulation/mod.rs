//! Level storage and the per-step burn drivers

mod level;
mod reactor;

pub use level::{GhostWidths, KnapsackWeights, LevelState};
pub use reactor::Reactor;
