//! Per-scenario workflow
//!
//! Drives one scenario through generate, evaluate, aggregate and the
//! refinement decision until it is accepted or generation gives up. The
//! workflow owns its [`ScenarioState`] exclusively; nothing else reads or
//! writes it until it is frozen into a [`CompletedScenario`].

use crate::collaborators::{GenerationRequest, Generator, JudgePanel, RefinementFeedback};
use crate::error::{GenerationError, WorkflowError};
use crate::evaluation::EvaluationStage;
use crate::refinement::{Decision, RefinementController};
use std::sync::Arc;
use switchgen_core::{
    aggregate, AcceptanceOutcome, CompletedScenario, EngineConfig, FailedScenario,
    ScenarioParameters, ScenarioState,
};
use tokio::time::timeout;

/// Terminal result of one workflow
#[derive(Debug, Clone)]
pub enum WorkflowOutcome {
    /// Accepted and frozen
    Accepted(CompletedScenario),
    /// Failed; never delivered
    Failed(FailedScenario),
}

/// Generation/evaluation/refinement driver shared by all workflows of a run
#[derive(Clone)]
pub struct Workflow {
    config: Arc<EngineConfig>,
    generator: Arc<dyn Generator>,
    stage: EvaluationStage,
    controller: RefinementController,
}

impl Workflow {
    /// Create a driver from collaborators
    #[must_use]
    pub fn new(config: Arc<EngineConfig>, generator: Arc<dyn Generator>, judges: JudgePanel) -> Self {
        Self {
            stage: EvaluationStage::new(judges, &config),
            controller: RefinementController::new(config.clone()),
            config,
            generator,
        }
    }

    /// Run one scenario to a terminal state
    pub async fn run(&self, parameters: ScenarioParameters) -> WorkflowOutcome {
        let mut state = ScenarioState::new(parameters);
        tracing::debug!(scenario = %state.id(), label = %state.parameters().label(), "workflow started");

        let outcome = match self.drive(&mut state).await {
            Ok(outcome) => outcome,
            Err(e) => return fail(state, &e),
        };

        let fallback = state.failure_record("illegal transition on acceptance");
        match state.accept(outcome) {
            Ok(completed) => {
                tracing::info!(
                    scenario = %completed.id(),
                    score = completed.score().unwrap_or_default(),
                    partial = completed.is_partial(),
                    refinements = completed.state().refine_count(),
                    "scenario accepted"
                );
                WorkflowOutcome::Accepted(completed)
            }
            Err(e) => {
                tracing::error!(scenario = %fallback.id, error = %e, "scenario could not be accepted");
                WorkflowOutcome::Failed(FailedScenario {
                    reason: e.to_string(),
                    ..fallback
                })
            }
        }
    }

    async fn drive(&self, state: &mut ScenarioState) -> Result<AcceptanceOutcome, WorkflowError> {
        let mut feedback: Option<RefinementFeedback> = None;

        loop {
            let text = self.generate(state.parameters(), feedback.as_ref()).await?;
            state.record_generation(text)?;

            let evaluation = self
                .stage
                .evaluate(state.parameters(), state.generated_text())
                .await;
            let scores = evaluation.scores();
            let aggregate = aggregate(&scores, &self.config.weights);

            tracing::debug!(
                scenario = %state.id(),
                score = aggregate.value,
                partial = aggregate.partial,
                refinements = state.refine_count(),
                "scenario evaluated"
            );

            match self.controller.decide(&aggregate, &scores, state.refine_count()) {
                Decision::Accept(outcome) => {
                    state.record_evaluation(evaluation, aggregate)?;
                    return Ok(outcome);
                }
                Decision::Refine => {
                    let next = RefinementController::feedback(
                        state.generated_text(),
                        &evaluation,
                        &aggregate,
                    );
                    state.record_evaluation(evaluation, aggregate)?;
                    state.begin_refinement()?;
                    tracing::info!(
                        scenario = %state.id(),
                        refinement = state.refine_count(),
                        "refining scenario"
                    );
                    feedback = Some(next);
                }
            }
        }
    }

    /// Call the generator until it yields non-blank text or the budget runs out
    async fn generate(
        &self,
        parameters: &ScenarioParameters,
        feedback: Option<&RefinementFeedback>,
    ) -> Result<Vec<String>, GenerationError> {
        let attempts = self.config.generation_attempts;
        let request = GenerationRequest {
            parameters,
            feedback,
        };
        let mut last = GenerationError::Empty;

        for attempt in 1..=attempts {
            let result = timeout(self.config.call_timeout(), self.generator.generate(request))
                .await
                .unwrap_or(Err(GenerationError::Timeout {
                    timeout_ms: self.config.call_timeout_ms,
                }));

            match result {
                Ok(text) if text.iter().any(|t| !t.trim().is_empty()) => return Ok(text),
                Ok(_) => last = GenerationError::Empty,
                Err(e) if e.is_retryable() => last = e,
                Err(e) => return Err(e),
            }
            tracing::warn!(attempt, attempts, error = %last, "generation attempt failed");
        }

        Err(GenerationError::Exhausted {
            attempts,
            last: Box::new(last),
        })
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("config", &self.config)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

fn fail(state: ScenarioState, error: &WorkflowError) -> WorkflowOutcome {
    let reason = error.to_string();
    let fallback = state.failure_record(reason.clone());
    match state.fail(reason) {
        Ok(failed) => {
            tracing::warn!(scenario = %failed.id, reason = %failed.reason, "scenario failed");
            WorkflowOutcome::Failed(failed)
        }
        Err(e) => {
            tracing::error!(scenario = %fallback.id, error = %e, "scenario failed in unexpected phase");
            WorkflowOutcome::Failed(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Judge, JudgeRequest, Judgement};
    use crate::error::EvaluationError;
    use parking_lot::Mutex;
    use switchgen_core::{expand_all, ScenarioConfig, WorkflowPhase};

    struct Replay {
        responses: Mutex<Vec<Result<Vec<String>, GenerationError>>>,
        saw_feedback: Mutex<Vec<bool>>,
    }

    impl Replay {
        fn new(mut responses: Vec<Result<Vec<String>, GenerationError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                saw_feedback: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Generator for Replay {
        async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError> {
            self.saw_feedback.lock().push(request.feedback.is_some());
            self.responses
                .lock()
                .pop()
                .unwrap_or_else(|| Err(GenerationError::Failed("script ended".into())))
        }
    }

    struct Fixed(f64);

    #[async_trait::async_trait]
    impl Judge for Fixed {
        async fn judge(&self, _request: JudgeRequest<'_>) -> Result<Judgement, EvaluationError> {
            Ok(Judgement {
                score: self.0,
                detail: serde_json::Value::Null,
                summary: "scripted".into(),
            })
        }
    }

    fn params() -> ScenarioParameters {
        expand_all(&ScenarioConfig::default()).unwrap().remove(0)
    }

    // 7 Arabic words and 3 English words: exactly the 30% target
    fn on_target() -> Vec<String> {
        vec!["كانت المباراة رائعة جدا اليوم في الملعب really great game".to_string()]
    }

    fn workflow(generator: Arc<dyn Generator>, judge_score: f64) -> Workflow {
        Workflow::new(
            Arc::new(EngineConfig::default()),
            generator,
            JudgePanel::uniform(Arc::new(Fixed(judge_score))),
        )
    }

    #[tokio::test]
    async fn accepts_on_first_attempt_above_threshold() {
        let generator = Arc::new(Replay::new(vec![Ok(on_target())]));
        let outcome = workflow(generator.clone(), 9.0).run(params()).await;

        let WorkflowOutcome::Accepted(completed) = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(completed.outcome(), &AcceptanceOutcome::MetThreshold);
        assert_eq!(completed.state().refine_count(), 0);
        assert_eq!(completed.state().phase(), WorkflowPhase::Accepted);
        assert_eq!(*generator.saw_feedback.lock(), vec![false]);
    }

    #[tokio::test]
    async fn refines_once_with_feedback_then_stops() {
        let generator = Arc::new(Replay::new(vec![
            Ok(vec!["first draft".to_string()]),
            Ok(on_target()),
        ]));
        let outcome = workflow(generator.clone(), 6.0).run(params()).await;

        let WorkflowOutcome::Accepted(completed) = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(completed.state().refine_count(), 1);
        assert_eq!(completed.state().generated_text(), on_target().as_slice());
        assert!(matches!(
            completed.outcome(),
            AcceptanceOutcome::RefinementExhausted { .. }
        ));
        assert_eq!(*generator.saw_feedback.lock(), vec![false, true]);
    }

    #[tokio::test]
    async fn empty_results_consume_attempts() {
        let generator = Arc::new(Replay::new(vec![
            Ok(Vec::new()),
            Ok(vec!["   ".to_string()]),
            Err(GenerationError::Failed("overloaded".into())),
            Ok(on_target()),
        ]));
        let outcome = workflow(generator.clone(), 9.0).run(params()).await;

        assert!(matches!(outcome, WorkflowOutcome::Accepted(_)));
        assert_eq!(generator.saw_feedback.lock().len(), 4);
    }

    #[tokio::test]
    async fn exhausted_generation_fails_scenario() {
        let generator = Arc::new(Replay::new(Vec::new()));
        let outcome = workflow(generator.clone(), 9.0).run(params()).await;

        let WorkflowOutcome::Failed(failed) = outcome else {
            panic!("expected failure");
        };
        assert!(failed.reason.contains("after 5 attempts"));
        assert_eq!(generator.saw_feedback.lock().len(), 5);
    }
}
