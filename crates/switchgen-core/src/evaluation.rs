//! Evaluation results
//!
//! One [`Evaluation`] holds the outcome of all four dimensions for a single
//! generation attempt. Judged dimensions either carry a score or a failure
//! marker; the ratio-match dimension is always scored, by the deterministic
//! calculator, and only its advisory notes may come from a judge.

use crate::aggregate::DimensionScores;
use crate::ratio::{RatioAssessment, RatioBreakdown};
use crate::types::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Score, detail payload and summary returned by a judge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedResult {
    /// Score in `0.0..=10.0`
    pub score: f64,
    /// Dimension-specific structured detail
    pub detail: serde_json::Value,
    /// Human-readable summary
    pub summary: String,
}

/// Marker recorded when a judged dimension could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFailure {
    /// Dimension that failed
    pub dimension: Dimension,
    /// Error description (timeout, judge error, ...)
    pub reason: String,
}

/// Outcome of a judged dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DimensionOutcome {
    /// Judge returned a valid result
    Scored(JudgedResult),
    /// Judge failed or timed out; no score is substituted
    Failed(DimensionFailure),
}

impl DimensionOutcome {
    /// Score, if the dimension was evaluated
    #[inline]
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        match self {
            DimensionOutcome::Scored(result) => Some(result.score),
            DimensionOutcome::Failed(_) => None,
        }
    }

    /// Failure marker, if any
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&DimensionFailure> {
        match self {
            DimensionOutcome::Scored(_) => None,
            DimensionOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Where the ratio-match notes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorySource {
    /// Qualitative commentary from the advisory judge
    Judge,
    /// Advisory judge configured but its call failed
    Unavailable,
    /// No advisory judge configured
    Disabled,
}

/// Qualitative annotation on the ratio-match result; never scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Narrative notes
    pub notes: String,
    /// Origin of the notes
    pub source: AdvisorySource,
}

/// Ratio-match dimension result
///
/// Score and breakdown are only reachable through [`RatioAssessment`], which
/// the deterministic calculator alone produces. No setter exists for either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioMatchResult {
    assessment: RatioAssessment,
    advisory: Advisory,
}

impl RatioMatchResult {
    /// Wrap a calculator assessment with its advisory notes
    #[inline]
    #[must_use]
    pub fn new(assessment: RatioAssessment, advisory: Advisory) -> Self {
        Self {
            assessment,
            advisory,
        }
    }

    /// Deterministic match score
    #[inline]
    #[must_use]
    pub fn score(&self) -> f64 {
        self.assessment.score
    }

    /// Deterministic word counts and percentages
    #[inline]
    #[must_use]
    pub fn breakdown(&self) -> &RatioBreakdown {
        &self.assessment.breakdown
    }

    /// Full calculator output
    #[inline]
    #[must_use]
    pub fn assessment(&self) -> &RatioAssessment {
        &self.assessment
    }

    /// Advisory annotation
    #[inline]
    #[must_use]
    pub fn advisory(&self) -> &Advisory {
        &self.advisory
    }

    /// One-line summary: computed ratio against target
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} (target {})",
            self.assessment.breakdown.computed_ratio, self.assessment.target
        )
    }
}

/// Results of all four dimensions for one generation attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Fluency outcome
    pub fluency: DimensionOutcome,
    /// Naturalness outcome
    pub naturalness: DimensionOutcome,
    /// Ratio-match result (always present)
    pub ratio_match: RatioMatchResult,
    /// Socio-cultural outcome
    pub socio_cultural: DimensionOutcome,
}

impl Evaluation {
    /// Scores for the aggregator, `None` for failed dimensions
    #[must_use]
    pub fn scores(&self) -> DimensionScores {
        DimensionScores {
            fluency: self.fluency.score(),
            naturalness: self.naturalness.score(),
            ratio_match: Some(self.ratio_match.score()),
            socio_cultural: self.socio_cultural.score(),
        }
    }

    /// Score of one dimension, if evaluated
    #[must_use]
    pub fn score(&self, dimension: Dimension) -> Option<f64> {
        self.scores().get(dimension)
    }

    /// Failure markers of judged dimensions
    #[must_use]
    pub fn failures(&self) -> Vec<&DimensionFailure> {
        [&self.fluency, &self.naturalness, &self.socio_cultural]
            .into_iter()
            .filter_map(DimensionOutcome::failure)
            .collect()
    }

    /// At least one judged dimension failed
    #[inline]
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures().is_empty()
    }

    /// Multi-line summary used as refinement feedback
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (label, outcome) in [
            ("Fluency", &self.fluency),
            ("Naturalness", &self.naturalness),
        ] {
            push_outcome(&mut out, label, outcome);
        }
        let _ = writeln!(
            out,
            "Ratio match: {:.2} - {}. {}",
            self.ratio_match.score(),
            self.ratio_match.summary(),
            self.ratio_match.advisory().notes
        );
        push_outcome(&mut out, "Socio-cultural", &self.socio_cultural);
        out
    }
}

fn push_outcome(out: &mut String, label: &str, outcome: &DimensionOutcome) {
    let _ = match outcome {
        DimensionOutcome::Scored(result) => {
            writeln!(out, "{label}: {:.2} - {}", result.score, result.summary)
        }
        DimensionOutcome::Failed(failure) => {
            writeln!(out, "{label}: not evaluated ({})", failure.reason)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::RatioCalculator;
    use crate::types::TargetRatio;
    use serde_json::json;

    fn judged(score: f64, summary: &str) -> DimensionOutcome {
        DimensionOutcome::Scored(JudgedResult {
            score,
            detail: json!({}),
            summary: summary.to_string(),
        })
    }

    fn ratio_result() -> RatioMatchResult {
        let assessment = RatioCalculator::assess(
            ["مرحبا hello"],
            "Arabic",
            "English",
            TargetRatio::new(50.0).unwrap(),
        );
        RatioMatchResult::new(
            assessment,
            Advisory {
                notes: "balanced".to_string(),
                source: AdvisorySource::Judge,
            },
        )
    }

    #[test]
    fn ratio_result_exposes_deterministic_score() {
        let result = ratio_result();
        assert_eq!(result.score(), 10.0);
        assert_eq!(result.breakdown().embedded_words, 1);
        assert_eq!(result.summary(), "50.0% English : 50.0% Arabic (target 50%)");
    }

    #[test]
    fn failed_dimension_has_no_score() {
        let evaluation = Evaluation {
            fluency: judged(9.0, "fluent"),
            naturalness: judged(8.0, "natural"),
            ratio_match: ratio_result(),
            socio_cultural: DimensionOutcome::Failed(DimensionFailure {
                dimension: Dimension::SocioCultural,
                reason: "timed out".to_string(),
            }),
        };

        assert!(evaluation.is_partial());
        assert_eq!(evaluation.score(Dimension::SocioCultural), None);
        assert_eq!(evaluation.score(Dimension::RatioMatch), Some(10.0));
        assert_eq!(evaluation.failures().len(), 1);

        let summary = evaluation.summary();
        assert!(summary.contains("Fluency: 9.00 - fluent"));
        assert!(summary.contains("Socio-cultural: not evaluated (timed out)"));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(judged(7.5, "ok")).unwrap();
        assert_eq!(value["status"], "scored");
        assert_eq!(value["score"], 7.5);
    }
}
