//! Accept/refine decision
//!
//! Applied once per evaluation. The refinement cap is checked before any
//! decision to loop, so a scenario never refines more than
//! `max_refinements` times regardless of its scores.

use crate::collaborators::RefinementFeedback;
use std::fmt::Write as _;
use std::sync::Arc;
use switchgen_core::{AcceptanceOutcome, AggregateScore, DimensionScores, EngineConfig, Evaluation};

/// Outcome of one refinement decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Stop and accept
    Accept(AcceptanceOutcome),
    /// Regenerate with feedback
    Refine,
}

/// Threshold, gate and cap policy
#[derive(Debug, Clone)]
pub struct RefinementController {
    config: Arc<EngineConfig>,
}

impl RefinementController {
    /// Create a controller sharing the engine configuration
    #[inline]
    #[must_use]
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Decide what to do with an evaluated scenario
    #[must_use]
    pub fn decide(
        &self,
        aggregate: &AggregateScore,
        scores: &DimensionScores,
        refine_count: u32,
    ) -> Decision {
        let failed_gates = self.config.failed_gates(scores);

        if aggregate.value >= self.config.acceptance_threshold && failed_gates.is_empty() {
            return Decision::Accept(AcceptanceOutcome::MetThreshold);
        }
        if refine_count >= self.config.max_refinements {
            return Decision::Accept(AcceptanceOutcome::RefinementExhausted { failed_gates });
        }
        Decision::Refine
    }

    /// Build regeneration feedback from the rejected attempt
    #[must_use]
    pub fn feedback(
        text: &[String],
        evaluation: &Evaluation,
        aggregate: &AggregateScore,
    ) -> RefinementFeedback {
        let mut summary = String::from("Generated text:\n");
        for line in text {
            summary.push_str(line);
            summary.push('\n');
        }
        summary.push_str("\nEvaluation:\n");
        summary.push_str(&evaluation.summary());
        let _ = write!(summary, "Aggregate score: {:.2}", aggregate.value);
        if aggregate.partial {
            let missing: Vec<_> = aggregate.missing.iter().map(ToString::to_string).collect();
            let _ = write!(summary, " (partial, missing {})", missing.join(", "));
        }

        RefinementFeedback {
            previous_text: text.to_vec(),
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use switchgen_core::{aggregate, Dimension, WeightVector};

    fn controller(config: EngineConfig) -> RefinementController {
        RefinementController::new(Arc::new(config))
    }

    fn uniform(score: f64) -> (AggregateScore, DimensionScores) {
        let scores = DimensionScores::complete(score, score, score, score);
        (aggregate(&scores, &WeightVector::default()), scores)
    }

    #[test]
    fn below_threshold_refines_once_then_accepts_exhausted() {
        let controller = controller(EngineConfig::default());
        let (agg, scores) = uniform(7.6);

        assert_eq!(controller.decide(&agg, &scores, 0), Decision::Refine);
        assert_eq!(
            controller.decide(&agg, &scores, 1),
            Decision::Accept(AcceptanceOutcome::RefinementExhausted {
                failed_gates: Vec::new()
            })
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let (agg, scores) = uniform(8.0);
        let controller = controller(EngineConfig::new().with_threshold(agg.value));
        assert_eq!(
            controller.decide(&agg, &scores, 0),
            Decision::Accept(AcceptanceOutcome::MetThreshold)
        );
    }

    #[test]
    fn zero_refinements_accepts_immediately() {
        let controller = controller(EngineConfig::new().with_max_refinements(0));
        let (agg, scores) = uniform(2.0);
        assert!(matches!(
            controller.decide(&agg, &scores, 0),
            Decision::Accept(AcceptanceOutcome::RefinementExhausted { .. })
        ));
    }

    #[test]
    fn failing_gate_blocks_acceptance() {
        let config = EngineConfig::new()
            .with_threshold(7.5)
            .with_gate(Dimension::RatioMatch, 5.0);
        let controller = controller(config);
        let scores = DimensionScores::complete(10.0, 10.0, 0.0, 10.0);
        let agg = aggregate(&scores, &WeightVector::default());
        assert!(agg.value > 7.5);

        assert_eq!(controller.decide(&agg, &scores, 0), Decision::Refine);
        assert_eq!(
            controller.decide(&agg, &scores, 1),
            Decision::Accept(AcceptanceOutcome::RefinementExhausted {
                failed_gates: vec![Dimension::RatioMatch]
            })
        );
    }

    proptest! {
        #[test]
        fn prop_never_refines_at_cap(
            score in 0.0f64..=10.0,
            max in 0u32..4,
            extra in 0u32..3,
        ) {
            let controller = controller(EngineConfig::new().with_max_refinements(max));
            let (agg, scores) = uniform(score);
            let decision = controller.decide(&agg, &scores, max + extra);
            prop_assert!(matches!(decision, Decision::Accept(_)));
        }
    }
}
