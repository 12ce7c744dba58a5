//! Parallel evaluation stage
//!
//! Runs the four dimension evaluators concurrently and joins on all of them.
//! Ratio match is computed locally and cannot fail; judged dimensions that
//! error or miss their deadline become failure markers instead of scores.

use crate::collaborators::{Judge, JudgePanel, JudgeRequest, Judgement};
use crate::error::EvaluationError;
use std::time::Duration;
use switchgen_core::evaluation::{
    Advisory, AdvisorySource, DimensionFailure, DimensionOutcome, Evaluation, RatioMatchResult,
};
use switchgen_core::ratio::{RatioAssessment, RatioCalculator, MAX_SCORE};
use switchgen_core::{Dimension, EngineConfig, ScenarioParameters};
use tokio::time::{timeout_at, Instant};

/// Fan-out/fan-in over the four evaluation dimensions
#[derive(Debug, Clone)]
pub struct EvaluationStage {
    judges: JudgePanel,
    call_timeout: Duration,
    stage_timeout: Duration,
}

impl EvaluationStage {
    /// Create a stage using the timeouts from `config`
    #[must_use]
    pub fn new(judges: JudgePanel, config: &EngineConfig) -> Self {
        Self {
            judges,
            call_timeout: config.call_timeout(),
            stage_timeout: config.stage_timeout(),
        }
    }

    /// Evaluate generated text on every dimension
    ///
    /// Never fails: each judged dimension yields either a score or a failure
    /// marker, and ratio match is always scored by the calculator.
    pub async fn evaluate(&self, parameters: &ScenarioParameters, text: &[String]) -> Evaluation {
        let assessment = RatioCalculator::assess(
            text,
            &parameters.first_language,
            &parameters.second_language,
            parameters.cs_ratio,
        );

        let now = Instant::now();
        let deadline = (now + self.call_timeout).min(now + self.stage_timeout);
        let budget = self.call_timeout.min(self.stage_timeout);

        let request = |dimension| JudgeRequest {
            dimension,
            parameters,
            text,
            ratio: None,
        };

        let (fluency, naturalness, socio_cultural, advisory) = tokio::join!(
            judged(self.judges.fluency.as_ref(), request(Dimension::Fluency), deadline, budget),
            judged(self.judges.naturalness.as_ref(), request(Dimension::Naturalness), deadline, budget),
            judged(self.judges.socio_cultural.as_ref(), request(Dimension::SocioCultural), deadline, budget),
            self.advise(parameters, text, &assessment, deadline, budget),
        );

        let evaluation = Evaluation {
            fluency,
            naturalness,
            ratio_match: RatioMatchResult::new(assessment, advisory),
            socio_cultural,
        };

        if evaluation.is_partial() {
            tracing::warn!(
                failed = evaluation.failures().len(),
                "evaluation completed with failed dimensions"
            );
        }
        evaluation
    }

    async fn advise(
        &self,
        parameters: &ScenarioParameters,
        text: &[String],
        assessment: &RatioAssessment,
        deadline: Instant,
        budget: Duration,
    ) -> Advisory {
        let Some(advisor) = &self.judges.ratio_advisor else {
            return Advisory {
                notes: assessment.breakdown.details.clone(),
                source: AdvisorySource::Disabled,
            };
        };

        let request = JudgeRequest {
            dimension: Dimension::RatioMatch,
            parameters,
            text,
            ratio: Some(assessment),
        };

        match call(advisor.as_ref(), request, deadline, budget).await {
            Ok(judgement) => Advisory {
                notes: judgement.summary,
                source: AdvisorySource::Judge,
            },
            Err(e) => {
                tracing::debug!(error = %e, "ratio advisory unavailable");
                Advisory {
                    notes: format!(
                        "{} Target ratio: {}. Qualitative commentary unavailable ({e}).",
                        assessment.breakdown.details, assessment.target
                    ),
                    source: AdvisorySource::Unavailable,
                }
            }
        }
    }
}

async fn judged(
    judge: &dyn Judge,
    request: JudgeRequest<'_>,
    deadline: Instant,
    budget: Duration,
) -> DimensionOutcome {
    let dimension = request.dimension;
    match call(judge, request, deadline, budget).await.and_then(in_range) {
        Ok(judgement) => {
            tracing::debug!(%dimension, score = judgement.score, "dimension judged");
            DimensionOutcome::Scored(judgement)
        }
        Err(e) => {
            tracing::warn!(%dimension, error = %e, "dimension evaluation failed");
            DimensionOutcome::Failed(DimensionFailure {
                dimension,
                reason: e.to_string(),
            })
        }
    }
}

async fn call(
    judge: &dyn Judge,
    request: JudgeRequest<'_>,
    deadline: Instant,
    budget: Duration,
) -> Result<Judgement, EvaluationError> {
    timeout_at(deadline, judge.judge(request))
        .await
        .map_err(|_| EvaluationError::Timeout {
            timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        })?
}

/// Judged scores outside `0.0..=10.0` count as a failed call
fn in_range(judgement: Judgement) -> Result<Judgement, EvaluationError> {
    if !judgement.score.is_finite() || !(0.0..=MAX_SCORE).contains(&judgement.score) {
        return Err(EvaluationError::ScoreOutOfRange(judgement.score));
    }
    Ok(judgement)
}
