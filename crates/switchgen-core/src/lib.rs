//! Switchgen Core - scenario model and deterministic scoring
//!
//! Pure building blocks of the code-switched sample engine:
//! - Expands a configuration of axes into scenario parameter records
//! - Counts matrix/embedded words and scores them against a target ratio
//! - Aggregates dimension scores with a validated weight vector
//! - Tracks per-scenario workflow state through a checked transition table
//!
//! Nothing in this crate performs I/O beyond loading configuration files;
//! the async workflow lives in `switchgen-engine`.
//!
//! # Example
//!
//! ```rust
//! use switchgen_core::{RatioCalculator, TargetRatio};
//!
//! let target = TargetRatio::new(30.0).unwrap();
//! let assessment = RatioCalculator::assess(["مرحبا hello"], "Arabic", "English", target);
//! assert_eq!(assessment.breakdown.embedded_words, 1);
//! ```

#![warn(unreachable_pub)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod expansion;
pub mod ratio;
pub mod state;
pub mod state_machine;
pub mod types;

pub use aggregate::{aggregate, AggregateScore, DimensionScores, WeightVector};
pub use config::{DimensionGate, EngineConfig, RunConfig};
pub use error::{ConfigurationError, StateMachineError};
pub use evaluation::{
    Advisory, AdvisorySource, DimensionFailure, DimensionOutcome, Evaluation, JudgedResult,
    RatioMatchResult,
};
pub use expansion::{expand, expand_all, Axis, ScenarioConfig, ScenarioExpander, ScenarioIter};
pub use ratio::{compute_ratio, ratio_score, RatioAssessment, RatioBreakdown, RatioCalculator};
pub use state::{
    AcceptanceOutcome, CompletedScenario, Disposition, FailedScenario, ScenarioState,
    WorkflowPhase,
};
pub use state_machine::{allowed_transitions, validate_transition};
pub use types::{Dimension, ScenarioId, ScenarioParameters, SpeakerProfile, TargetRatio};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Switchgen Core
    pub use crate::{
        AcceptanceOutcome, CompletedScenario, Dimension, EngineConfig, Evaluation,
        ScenarioConfig, ScenarioParameters, ScenarioState, TargetRatio, WeightVector,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
