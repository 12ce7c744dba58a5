//! Switchgen Engine - scenario orchestration
//!
//! Drives every scenario of a configuration through generation, parallel
//! four-dimension evaluation and bounded refinement:
//! - Streams scenarios with bounded concurrency
//! - Degrades gracefully when a judge fails or times out
//! - Caps refinement cycles independently of scores
//! - Delivers accepted scenarios to a pluggable sink
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchgen_engine::{offline, MemorySink, Orchestrator};
//! use switchgen_core::{EngineConfig, ScenarioConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = Arc::new(MemorySink::new());
//! let orchestrator = Orchestrator::new(
//!     EngineConfig::default(),
//!     Arc::new(offline::ScriptedGenerator),
//!     offline::scripted_panel(9.0),
//!     sink.clone(),
//! )?;
//!
//! let report = orchestrator.run_config(&ScenarioConfig::default()).await?;
//! println!("accepted {} scenarios", report.accepted());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod collaborators;
pub mod error;
pub mod evaluation;
pub mod offline;
pub mod orchestrator;
pub mod refinement;
pub mod sink;
pub mod telemetry;
pub mod workflow;

pub use collaborators::{
    GenerationRequest, Generator, Judge, JudgePanel, JudgeRequest, Judgement, RefinementFeedback,
};
pub use error::{EngineError, EvaluationError, GenerationError, SinkError, WorkflowError};
pub use evaluation::EvaluationStage;
pub use orchestrator::{
    Orchestrator, RunReport, ScenarioOutcome, ShutdownHandle, UndeliveredScenario,
};
pub use refinement::{Decision, RefinementController};
pub use sink::{JsonlSink, MemorySink, ResultSink};
pub use workflow::{Workflow, WorkflowOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the Switchgen engine
    pub use crate::{
        Generator, Judge, JudgePanel, MemorySink, Orchestrator, ResultSink, RunReport,
        ShutdownHandle,
    };
    pub use switchgen_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
