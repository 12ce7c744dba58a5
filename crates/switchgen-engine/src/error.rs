//! Error types for the Switchgen engine
//!
//! Provides error handling for:
//! - Generator calls and their retry budget
//! - Judge calls (absorbed at the evaluation stage boundary)
//! - Sink delivery
//! - Workflow driving and engine setup

use switchgen_core::{ConfigurationError, StateMachineError};

/// Generator errors
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Generator reported a failure
    #[error("generation failed: {0}")]
    Failed(String),

    /// Call exceeded its timeout
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout {
        /// Per-call timeout in milliseconds
        timeout_ms: u64,
    },

    /// Generator returned no usable text
    #[error("generator returned empty text")]
    Empty,

    /// Retry budget spent
    #[error("generation failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Check if another attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Timeout { .. } | Self::Empty)
    }
}

/// Judge errors
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// Judge reported a failure
    #[error("judge failed: {0}")]
    Failed(String),

    /// Call exceeded its timeout or the stage deadline
    #[error("judge timed out after {timeout_ms}ms")]
    Timeout {
        /// Effective budget in milliseconds
        timeout_ms: u64,
    },

    /// Judge returned a score outside `0.0..=10.0`
    #[error("judge score {0} outside 0..=10")]
    ScoreOutOfRange(f64),
}

/// Sink delivery errors
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Underlying I/O failure
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario could not be serialised
    #[error("sink serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sink refused the scenario
    #[error("sink rejected scenario: {0}")]
    Rejected(String),
}

/// Errors that end a single workflow
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Generation could not produce text
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Driver attempted an illegal phase transition
    #[error(transparent)]
    State(#[from] StateMachineError),
}

/// Top-level engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Sink could not be set up
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}
