//! Error type for the reactive source engine
//!
//! Per-cell integration failures are not errors: they are reported through
//! the success flag of the burn outcome.

use crate::config::TimeIntegration;

/// Errors that can occur when driving a burn
#[derive(Debug, Clone, PartialEq)]
pub enum ReactError {
    /// Entry point called under a time integration method it does not support
    UnsupportedIntegration {
        /// Entry point that was called
        operation: &'static str,
        /// Method the engine is configured for
        configured: TimeIntegration,
    },
    /// Cost-balanced partition could not be built
    InvalidPartition(String),
    /// Fields passed together disagree on their layout
    LayoutMismatch(String),
}

impl std::fmt::Display for ReactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReactError::UnsupportedIntegration {
                operation,
                configured,
            } => write!(
                f,
                "{operation} is not supported with the {configured:?} time integration method"
            ),
            ReactError::InvalidPartition(msg) => write!(f, "Invalid partition: {msg}"),
            ReactError::LayoutMismatch(msg) => write!(f, "Layout mismatch: {msg}"),
        }
    }
}

impl std::error::Error for ReactError {}
