//! Core types for Switchgen
//!
//! Defines the fundamental scenario types:
//! - Scenario identifiers
//! - Target ratios and speaker demographics
//! - Scenario parameter records
//! - Evaluation dimensions

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique scenario run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioId(pub Ulid);

impl ScenarioId {
    /// Generate new scenario ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target share of the embedded language, in percent (0..=100)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TargetRatio(f64);

impl TryFrom<f64> for TargetRatio {
    type Error = ConfigurationError;

    fn try_from(percent: f64) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl From<TargetRatio> for f64 {
    fn from(ratio: TargetRatio) -> Self {
        ratio.0
    }
}

impl TargetRatio {
    /// Create a target ratio from a percentage
    ///
    /// # Errors
    /// `ConfigurationError::InvalidTargetRatio` if the value is not finite or
    /// outside 0..=100.
    pub fn new(percent: f64) -> Result<Self, ConfigurationError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(ConfigurationError::InvalidTargetRatio {
                value: percent.to_string(),
                reason: "must be between 0 and 100".to_string(),
            });
        }
        Ok(Self(percent))
    }

    /// Embedded-language percentage
    #[inline]
    #[must_use]
    pub fn percent(self) -> f64 {
        self.0
    }

    /// Matrix-language percentage implied by this target
    #[inline]
    #[must_use]
    pub fn matrix_percent(self) -> f64 {
        100.0 - self.0
    }
}

impl FromStr for TargetRatio {
    type Err = ConfigurationError;

    /// Accepts `"30%"`, `"30"` and `" 30 % "`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let percent = number
            .parse::<f64>()
            .map_err(|e| ConfigurationError::InvalidTargetRatio {
                value: s.to_string(),
                reason: e.to_string(),
            })?;
        Self::new(percent).map_err(|_| ConfigurationError::InvalidTargetRatio {
            value: s.to_string(),
            reason: "must be between 0 and 100".to_string(),
        })
    }
}

impl fmt::Display for TargetRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Speaker demographics attached to a scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeakerProfile {
    /// Speaker gender
    pub gender: String,
    /// Age band (e.g. "26-35")
    pub age: String,
    /// Education level
    pub education_level: String,
}

/// One fully specified combination of generation parameters
///
/// Produced once by the expander and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    /// Conversation topic
    pub topic: String,
    /// Grammatical tense
    pub tense: String,
    /// Narrative perspective
    pub perspective: String,
    /// Matrix (dominant) language
    pub first_language: String,
    /// Embedded (secondary) language
    pub second_language: String,
    /// Target embedded-language share
    pub cs_ratio: TargetRatio,
    /// Code-switching function tag
    pub cs_function: String,
    /// Code-switching type tag
    pub cs_type: String,
    /// Speaker demographics
    pub speaker: SpeakerProfile,
    /// Conversation form (e.g. "single_turn")
    pub conversation_type: String,
}

impl ScenarioParameters {
    /// Short label used in logs and failure reports
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}/{} topic={} ratio={} function={} type={}",
            self.first_language,
            self.second_language,
            self.topic,
            self.cs_ratio,
            self.cs_function,
            self.cs_type
        )
    }
}

/// Independent quality axes evaluated per scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Grammatical and lexical fluency
    Fluency,
    /// Naturalness of the switch points
    Naturalness,
    /// Match against the target language ratio
    RatioMatch,
    /// Socio-cultural appropriateness
    SocioCultural,
}

impl Dimension {
    /// All dimensions in evaluation order
    pub const ALL: [Dimension; 4] = [
        Dimension::Fluency,
        Dimension::Naturalness,
        Dimension::RatioMatch,
        Dimension::SocioCultural,
    ];

    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Fluency => "fluency",
            Dimension::Naturalness => "naturalness",
            Dimension::RatioMatch => "ratio_match",
            Dimension::SocioCultural => "socio_cultural",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_id_generation() {
        let id1 = ScenarioId::new();
        let id2 = ScenarioId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn target_ratio_parses_percent_forms() {
        assert_eq!("30%".parse::<TargetRatio>().unwrap().percent(), 30.0);
        assert_eq!("30".parse::<TargetRatio>().unwrap().percent(), 30.0);
        assert_eq!(" 12.5 % ".parse::<TargetRatio>().unwrap().percent(), 12.5);
    }

    #[test]
    fn target_ratio_rejects_garbage_and_out_of_range() {
        assert!("thirty".parse::<TargetRatio>().is_err());
        assert!("120%".parse::<TargetRatio>().is_err());
        assert!("-1".parse::<TargetRatio>().is_err());
        assert!(TargetRatio::new(f64::NAN).is_err());
    }

    #[test]
    fn target_ratio_deserialization_validates() {
        let ratio: TargetRatio = serde_json::from_str("30.0").unwrap();
        assert_eq!(ratio.percent(), 30.0);
        assert_eq!(serde_json::to_string(&ratio).unwrap(), "30.0");
        assert!(serde_json::from_str::<TargetRatio>("150.0").is_err());
    }

    #[test]
    fn target_ratio_matrix_complement() {
        let ratio = TargetRatio::new(30.0).unwrap();
        assert_eq!(ratio.matrix_percent(), 70.0);
        assert_eq!(ratio.to_string(), "30%");
    }

    #[test]
    fn dimension_names_are_stable() {
        let names: Vec<_> = Dimension::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec!["fluency", "naturalness", "ratio_match", "socio_cultural"]
        );
    }
}
