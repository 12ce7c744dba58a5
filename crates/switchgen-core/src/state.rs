//! Per-scenario workflow state
//!
//! A [`ScenarioState`] is created when a workflow starts and is owned by that
//! workflow alone. Terminal transitions consume it: acceptance yields a
//! read-only [`CompletedScenario`] for the sink, failure yields a
//! [`FailedScenario`] record for the run report.

use crate::aggregate::AggregateScore;
use crate::error::StateMachineError;
use crate::evaluation::Evaluation;
use crate::state_machine::validate_transition;
use crate::types::{Dimension, ScenarioId, ScenarioParameters};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Workflow phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Created, nothing generated yet
    Pending,
    /// Candidate text available
    Generated,
    /// All four dimensions evaluated and aggregated
    Evaluated,
    /// Regenerating with evaluation feedback
    Refining,
    /// Terminal: accepted
    Accepted,
    /// Terminal: unrecoverable failure
    Failed,
}

impl WorkflowPhase {
    /// No further transitions possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowPhase::Accepted | WorkflowPhase::Failed)
    }
}

/// Why a scenario was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcceptanceOutcome {
    /// Aggregate reached the threshold and every gate passed
    MetThreshold,
    /// Refinement budget spent; best achieved result kept
    RefinementExhausted {
        /// Dimensions below their configured minimum
        failed_gates: Vec<Dimension>,
    },
}

/// Terminal disposition of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum Disposition {
    /// Accepted with an outcome
    Accepted {
        /// Acceptance reason
        outcome: AcceptanceOutcome,
    },
    /// Failed with a reason
    Failed {
        /// Failure description
        reason: String,
    },
}

/// Mutable per-run container
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioState {
    id: ScenarioId,
    parameters: ScenarioParameters,
    phase: WorkflowPhase,
    generated_text: Vec<String>,
    evaluation: Option<Evaluation>,
    aggregate: Option<AggregateScore>,
    refine_count: u32,
    disposition: Option<Disposition>,
    started_at: DateTime<Utc>,
}

impl ScenarioState {
    /// Create state for a new workflow
    #[must_use]
    pub fn new(parameters: ScenarioParameters) -> Self {
        Self {
            id: ScenarioId::new(),
            parameters,
            phase: WorkflowPhase::Pending,
            generated_text: Vec::new(),
            evaluation: None,
            aggregate: None,
            refine_count: 0,
            disposition: None,
            started_at: Utc::now(),
        }
    }

    /// Run identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> ScenarioId {
        self.id
    }

    /// Scenario parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &ScenarioParameters {
        &self.parameters
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    /// Latest generated text
    #[inline]
    #[must_use]
    pub fn generated_text(&self) -> &[String] {
        &self.generated_text
    }

    /// Latest evaluation
    #[inline]
    #[must_use]
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Latest aggregate score
    #[inline]
    #[must_use]
    pub fn aggregate(&self) -> Option<&AggregateScore> {
        self.aggregate.as_ref()
    }

    /// Refinements performed so far
    #[inline]
    #[must_use]
    pub fn refine_count(&self) -> u32 {
        self.refine_count
    }

    /// Terminal disposition, once reached
    #[inline]
    #[must_use]
    pub fn disposition(&self) -> Option<&Disposition> {
        self.disposition.as_ref()
    }

    fn transition(&mut self, to: WorkflowPhase) -> Result<(), StateMachineError> {
        validate_transition(self.phase, to)?;
        tracing::trace!(scenario = %self.id, from = ?self.phase, to = ?to, "phase transition");
        self.phase = to;
        Ok(())
    }

    /// Store freshly generated text, discarding any previous evaluation
    ///
    /// # Errors
    /// `StateMachineError` unless the workflow is `Pending` or `Refining`.
    pub fn record_generation(&mut self, text: Vec<String>) -> Result<(), StateMachineError> {
        self.transition(WorkflowPhase::Generated)?;
        self.generated_text = text;
        self.evaluation = None;
        self.aggregate = None;
        Ok(())
    }

    /// Store evaluation results and their aggregate
    ///
    /// # Errors
    /// `StateMachineError` unless the workflow is `Generated`.
    pub fn record_evaluation(
        &mut self,
        evaluation: Evaluation,
        aggregate: AggregateScore,
    ) -> Result<(), StateMachineError> {
        self.transition(WorkflowPhase::Evaluated)?;
        self.evaluation = Some(evaluation);
        self.aggregate = Some(aggregate);
        Ok(())
    }

    /// Enter refinement, counting the attempt
    ///
    /// # Errors
    /// `StateMachineError` unless the workflow is `Evaluated`.
    pub fn begin_refinement(&mut self) -> Result<(), StateMachineError> {
        self.transition(WorkflowPhase::Refining)?;
        self.refine_count += 1;
        Ok(())
    }

    /// Accept the scenario, freezing its state
    ///
    /// # Errors
    /// `StateMachineError` unless the workflow is `Evaluated`.
    pub fn accept(mut self, outcome: AcceptanceOutcome) -> Result<CompletedScenario, StateMachineError> {
        self.transition(WorkflowPhase::Accepted)?;
        self.disposition = Some(Disposition::Accepted {
            outcome: outcome.clone(),
        });
        Ok(CompletedScenario {
            state: self,
            outcome,
            completed_at: Utc::now(),
        })
    }

    /// Fail the scenario
    ///
    /// # Errors
    /// `StateMachineError` unless the workflow is `Pending` or `Refining`.
    pub fn fail(mut self, reason: impl Into<String>) -> Result<FailedScenario, StateMachineError> {
        self.transition(WorkflowPhase::Failed)?;
        let record = self.failure_record(reason);
        self.disposition = Some(Disposition::Failed {
            reason: record.reason.clone(),
        });
        Ok(record)
    }

    /// Failure record for this scenario, leaving its phase untouched
    #[must_use]
    pub fn failure_record(&self, reason: impl Into<String>) -> FailedScenario {
        FailedScenario {
            id: self.id,
            label: self.parameters.label(),
            refine_count: self.refine_count,
            reason: reason.into(),
        }
    }
}

/// Accepted, immutable scenario handed to the sink
#[derive(Debug, Clone, Serialize)]
pub struct CompletedScenario {
    #[serde(flatten)]
    state: ScenarioState,
    #[serde(skip)]
    outcome: AcceptanceOutcome,
    completed_at: DateTime<Utc>,
}

impl CompletedScenario {
    /// Frozen state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ScenarioState {
        &self.state
    }

    /// Run identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> ScenarioId {
        self.state.id
    }

    /// Scenario parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &ScenarioParameters {
        &self.state.parameters
    }

    /// Acceptance outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &AcceptanceOutcome {
        &self.outcome
    }

    /// Final aggregate score
    #[inline]
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.state.aggregate.as_ref().map(|a| a.value)
    }

    /// Final evaluation was missing a judged dimension
    #[inline]
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.state.aggregate.as_ref().is_some_and(|a| a.partial)
    }

    /// Completion time
    #[inline]
    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Record of a scenario that reached `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedScenario {
    /// Run identifier
    pub id: ScenarioId,
    /// Parameter label
    pub label: String,
    /// Refinements performed before failing
    pub refine_count: u32,
    /// Failure description
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, WeightVector};
    use crate::evaluation::{Advisory, AdvisorySource, DimensionOutcome, JudgedResult, RatioMatchResult};
    use crate::expansion::{expand_all, ScenarioConfig};
    use crate::ratio::RatioCalculator;

    fn params() -> ScenarioParameters {
        expand_all(&ScenarioConfig::default()).unwrap().remove(0)
    }

    fn evaluation(score: f64) -> Evaluation {
        let judged = || {
            DimensionOutcome::Scored(JudgedResult {
                score,
                detail: serde_json::Value::Null,
                summary: String::new(),
            })
        };
        let p = params();
        Evaluation {
            fluency: judged(),
            naturalness: judged(),
            ratio_match: RatioMatchResult::new(
                RatioCalculator::assess(["hello"], &p.first_language, &p.second_language, p.cs_ratio),
                Advisory {
                    notes: String::new(),
                    source: AdvisorySource::Disabled,
                },
            ),
            socio_cultural: judged(),
        }
    }

    #[test]
    fn refinement_cycle_replaces_text_and_clears_results() {
        let mut state = ScenarioState::new(params());
        state.record_generation(vec!["first".to_string()]).unwrap();
        let eval = evaluation(7.0);
        let agg = aggregate(&eval.scores(), &WeightVector::default());
        state.record_evaluation(eval, agg).unwrap();

        state.begin_refinement().unwrap();
        assert_eq!(state.refine_count(), 1);
        assert_eq!(state.phase(), WorkflowPhase::Refining);

        state.record_generation(vec!["second".to_string()]).unwrap();
        assert_eq!(state.generated_text(), ["second".to_string()]);
        assert!(state.evaluation().is_none());
        assert!(state.aggregate().is_none());
    }

    #[test]
    fn accept_requires_evaluation() {
        let mut state = ScenarioState::new(params());
        state.record_generation(vec!["text".to_string()]).unwrap();
        assert!(state.clone().accept(AcceptanceOutcome::MetThreshold).is_err());

        let eval = evaluation(9.0);
        let agg = aggregate(&eval.scores(), &WeightVector::default());
        state.record_evaluation(eval, agg).unwrap();

        let completed = state.accept(AcceptanceOutcome::MetThreshold).unwrap();
        assert_eq!(completed.outcome(), &AcceptanceOutcome::MetThreshold);
        assert_eq!(completed.state().phase(), WorkflowPhase::Accepted);
        assert!(!completed.is_partial());
    }

    #[test]
    fn fail_from_pending_records_reason() {
        let state = ScenarioState::new(params());
        let id = state.id();
        let failed = state.fail("generation exhausted").unwrap();
        assert_eq!(failed.id, id);
        assert_eq!(failed.reason, "generation exhausted");
        assert!(failed.label.contains("Arabic/English"));
    }

    #[test]
    fn completed_scenario_serializes_flat() {
        let mut state = ScenarioState::new(params());
        state.record_generation(vec!["text".to_string()]).unwrap();
        let eval = evaluation(9.0);
        let agg = aggregate(&eval.scores(), &WeightVector::default());
        state.record_evaluation(eval, agg).unwrap();
        let completed = state.accept(AcceptanceOutcome::MetThreshold).unwrap();

        let value = serde_json::to_value(&completed).unwrap();
        assert_eq!(value["phase"], "accepted");
        assert_eq!(value["disposition"]["disposition"], "accepted");
        assert_eq!(value["parameters"]["first_language"], "Arabic");
        assert!(value["completed_at"].is_string());
    }
}
