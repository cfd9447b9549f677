//! Error types for the reveal core
//!
//! Every error here is synchronous and local. A failed operation leaves the
//! solver, ledger, and sequencer exactly as they were before the call.

use thiserror::Error;

use crate::sequencer::RevealState;

/// Errors returned by layout, lottery, and sequencer operations
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RevealError {
    /// Invalid geometry or round options
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Lifecycle operation not allowed in the current state
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation (e.g. "start round")
        operation: &'static str,
        /// State the sequencer was in when the operation was rejected
        state: RevealState,
    },

    /// No eligible candidates to draw from
    #[error("No eligible photos to draw from")]
    EmptyPool,

    /// A round was started outside of a tokio runtime
    #[error("Reveal timers require a running tokio runtime")]
    NoRuntime,
}

impl RevealError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result alias used throughout the reveal core
pub type Result<T> = std::result::Result<T, RevealError>;
