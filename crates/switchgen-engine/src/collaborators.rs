//! External collaborator contracts
//!
//! The engine never produces or judges text itself. A [`Generator`] writes
//! candidate text and one [`Judge`] per dimension scores it; both are
//! injected as trait objects so deployments and tests choose the backend.

use crate::error::{EvaluationError, GenerationError};
use std::sync::Arc;
use switchgen_core::{Dimension, JudgedResult, RatioAssessment, ScenarioParameters};

/// Context for regenerating after a failed evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementFeedback {
    /// Text produced by the previous attempt
    pub previous_text: Vec<String>,
    /// Per-dimension evaluation summary of that text
    pub summary: String,
}

/// Input to a generator call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Scenario to write for
    pub parameters: &'a ScenarioParameters,
    /// Present on refinement attempts
    pub feedback: Option<&'a RefinementFeedback>,
}

/// Text generation capability
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Produce one or more text units for the scenario
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError>;
}

/// Input to a judge call
#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
    /// Dimension being judged
    pub dimension: Dimension,
    /// Scenario the text was written for
    pub parameters: &'a ScenarioParameters,
    /// Text under evaluation
    pub text: &'a [String],
    /// Deterministic ratio result; set only for the ratio advisor
    pub ratio: Option<&'a RatioAssessment>,
}

/// Score, structured detail and summary returned by a judge
pub type Judgement = JudgedResult;

/// Evaluation capability for a single dimension
#[async_trait::async_trait]
pub trait Judge: Send + Sync {
    /// Judge the text
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<Judgement, EvaluationError>;
}

/// Judges used by the evaluation stage
///
/// The ratio advisor is optional and only contributes narrative notes; the
/// ratio-match score never comes from it.
#[derive(Clone)]
pub struct JudgePanel {
    /// Fluency judge
    pub fluency: Arc<dyn Judge>,
    /// Naturalness judge
    pub naturalness: Arc<dyn Judge>,
    /// Socio-cultural judge
    pub socio_cultural: Arc<dyn Judge>,
    /// Optional ratio-match commentator
    pub ratio_advisor: Option<Arc<dyn Judge>>,
}

impl JudgePanel {
    /// Create a panel without a ratio advisor
    #[inline]
    #[must_use]
    pub fn new(
        fluency: Arc<dyn Judge>,
        naturalness: Arc<dyn Judge>,
        socio_cultural: Arc<dyn Judge>,
    ) -> Self {
        Self {
            fluency,
            naturalness,
            socio_cultural,
            ratio_advisor: None,
        }
    }

    /// Use the same judge for every judged dimension
    #[inline]
    #[must_use]
    pub fn uniform(judge: Arc<dyn Judge>) -> Self {
        Self::new(judge.clone(), judge.clone(), judge)
    }

    /// With a ratio advisor
    #[inline]
    #[must_use]
    pub fn with_ratio_advisor(mut self, advisor: Arc<dyn Judge>) -> Self {
        self.ratio_advisor = Some(advisor);
        self
    }
}

impl std::fmt::Debug for JudgePanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgePanel")
            .field("ratio_advisor", &self.ratio_advisor.is_some())
            .finish_non_exhaustive()
    }
}
