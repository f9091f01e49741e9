//! Core types and utilities

pub mod geometry;
pub mod layout;

pub use geometry::{BoxArray, Geometry, IntBox, IntVect};
pub use layout::StateLayout;
