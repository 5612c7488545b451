//! Result and error types for Asentar.

use crate::event::EventId;
use thiserror::Error;

/// Result type for Asentar operations
pub type AsentarResult<T> = Result<T, AsentarError>;

/// Errors that can occur in Asentar
#[derive(Debug, Error)]
pub enum AsentarError {
    /// Selector matched no elements
    #[error("no element matched {selector}")]
    NotFound {
        /// Selector that failed to resolve
        selector: String,
    },

    /// Selector matched more than one element
    #[error("{selector} matched {count} elements; narrow the query or request first-match semantics")]
    AmbiguousMatch {
        /// Selector that over-matched
        selector: String,
        /// Number of elements that matched
        count: usize,
    },

    /// Wait exceeded its timeout budget
    #[error("wait timed out after {ms}ms; last check: {last_failure}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Last observed predicate failure state
        last_failure: String,
    },

    /// Expectation failed
    #[error("assertion failed: {message}")]
    Assertion {
        /// Human-readable diff of expected vs actual
        message: String,
    },

    /// A queued transition failed while draining
    #[error("transition {seq} from {origin} failed")]
    Transition {
        /// Origin event of the failing transition
        origin: EventId,
        /// Sequence number of the failing transition
        seq: u64,
        /// Underlying failure
        #[source]
        source: Box<AsentarError>,
    },

    /// Operation called in a state that violates its contract
    #[error("invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AsentarError {
    /// Create an invalid-state error from a message
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an assertion error from a message
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }
}
