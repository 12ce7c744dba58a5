//! Error types for Switchgen Core
//!
//! Provides error handling for:
//! - Configuration and scenario expansion failures
//! - Workflow phase transition violations

use crate::state::WorkflowPhase;

/// Configuration errors
///
/// Always fatal: raised before any scenario workflow starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A list-valued axis has no values
    #[error("axis `{0}` is empty; an empty axis would produce zero scenarios")]
    EmptyAxis(&'static str),

    /// A constant field is blank
    #[error("field `{0}` must not be blank")]
    BlankField(&'static str),

    /// Target ratio does not parse or is outside 0..=100
    #[error("invalid target ratio `{value}`: {reason}")]
    InvalidTargetRatio {
        /// Raw value as configured
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Weight vector has a negative or non-finite component
    #[error("weight for {dimension} must be a finite non-negative number, got {value}")]
    NegativeWeight {
        /// Offending dimension
        dimension: &'static str,
        /// Rejected weight
        value: f64,
    },

    /// Weight vector does not sum to 1.0
    #[error("weights must sum to 1.0, got {sum}")]
    WeightSum {
        /// Actual sum of the components
        sum: f64,
    },

    /// Engine setting outside its valid range
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        /// Setting name
        field: &'static str,
        /// Allowed range
        reason: String,
    },

    /// Scenario space too large to count
    #[error("scenario count overflows usize")]
    ScenarioCountOverflow,

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("failed to parse config {path}: {message}")]
    Parse {
        /// Config file path
        path: String,
        /// Parser message
        message: String,
    },
}

/// Workflow state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Transition not present in the transition table
    #[error("illegal phase transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: WorkflowPhase,
        /// Requested phase
        to: WorkflowPhase,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_axis_display_names_axis() {
        let err = ConfigurationError::EmptyAxis("topic");
        assert!(err.to_string().contains("`topic`"));
    }

    #[test]
    fn weight_sum_display() {
        let err = ConfigurationError::WeightSum { sum: 0.9 };
        assert_eq!(err.to_string(), "weights must sum to 1.0, got 0.9");
    }

    #[test]
    fn illegal_transition_display() {
        let err = StateMachineError::IllegalTransition {
            from: WorkflowPhase::Accepted,
            to: WorkflowPhase::Refining,
        };
        assert!(err.to_string().contains("Accepted -> Refining"));
    }
}
