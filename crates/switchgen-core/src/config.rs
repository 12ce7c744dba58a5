//! Engine and run configuration
//!
//! Configuration is immutable once loaded. [`RunConfig`] bundles the engine
//! settings with the scenario space and is read from a TOML or YAML file,
//! picked by extension.

use crate::aggregate::{DimensionScores, WeightVector};
use crate::error::ConfigurationError;
use crate::expansion::ScenarioConfig;
use crate::ratio::MAX_SCORE;
use crate::types::Dimension;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minimum score a single dimension must reach for acceptance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionGate {
    /// Gated dimension
    pub dimension: Dimension,
    /// Minimum score in `0.0..=10.0`
    pub min_score: f64,
}

impl DimensionGate {
    /// Whether a score satisfies the gate; a missing score never does
    #[inline]
    #[must_use]
    pub fn passes(&self, score: Option<f64>) -> bool {
        score.is_some_and(|s| s >= self.min_score)
    }
}

/// Engine settings shared by every workflow of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Aggregation weights
    pub weights: WeightVector,
    /// Aggregate score required for acceptance
    pub acceptance_threshold: f64,
    /// Maximum refinement cycles per scenario
    pub max_refinements: u32,
    /// Optional per-dimension minimums (none by default)
    pub gates: Vec<DimensionGate>,
    /// Maximum workflows in flight
    pub max_concurrent_scenarios: usize,
    /// Per-call timeout for generator and judge calls, in milliseconds
    pub call_timeout_ms: u64,
    /// Deadline for a whole evaluation stage, in milliseconds
    pub stage_timeout_ms: u64,
    /// Generator calls per generation before giving up
    pub generation_attempts: u32,
    /// Sink delivery attempts per accepted scenario
    pub sink_attempts: u32,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With aggregation weights
    #[inline]
    #[must_use]
    pub fn with_weights(mut self, weights: WeightVector) -> Self {
        self.weights = weights;
        self
    }

    /// With acceptance threshold
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    /// With maximum refinement cycles
    #[inline]
    #[must_use]
    pub fn with_max_refinements(mut self, max: u32) -> Self {
        self.max_refinements = max;
        self
    }

    /// With an additional dimension gate
    #[inline]
    #[must_use]
    pub fn with_gate(mut self, dimension: Dimension, min_score: f64) -> Self {
        self.gates.push(DimensionGate {
            dimension,
            min_score,
        });
        self
    }

    /// With maximum concurrent workflows
    #[inline]
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_scenarios = max;
        self
    }

    /// With per-call timeout
    #[inline]
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With evaluation stage deadline
    #[inline]
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With generator attempts per generation
    #[inline]
    #[must_use]
    pub fn with_generation_attempts(mut self, attempts: u32) -> Self {
        self.generation_attempts = attempts;
        self
    }

    /// With sink delivery attempts
    #[inline]
    #[must_use]
    pub fn with_sink_attempts(mut self, attempts: u32) -> Self {
        self.sink_attempts = attempts;
        self
    }

    /// Per-call timeout
    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Evaluation stage deadline
    #[inline]
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    /// Dimensions whose gate is not satisfied by `scores`
    #[must_use]
    pub fn failed_gates(&self, scores: &DimensionScores) -> Vec<Dimension> {
        self.gates
            .iter()
            .filter(|gate| !gate.passes(scores.get(gate.dimension)))
            .map(|gate| gate.dimension)
            .collect()
    }

    /// Check ranges of every setting
    ///
    /// # Errors
    /// `ConfigurationError::InvalidSetting` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigurationError::InvalidSetting {
                field,
                reason: reason.to_string(),
            })
        };

        if !self.acceptance_threshold.is_finite()
            || !(0.0..=MAX_SCORE).contains(&self.acceptance_threshold)
        {
            return invalid("acceptance_threshold", "must be between 0 and 10");
        }
        if self.max_concurrent_scenarios == 0 {
            return invalid("max_concurrent_scenarios", "must be at least 1");
        }
        if self.call_timeout_ms == 0 {
            return invalid("call_timeout_ms", "must be positive");
        }
        if self.stage_timeout_ms == 0 {
            return invalid("stage_timeout_ms", "must be positive");
        }
        if self.generation_attempts == 0 {
            return invalid("generation_attempts", "must be at least 1");
        }
        if self.sink_attempts == 0 {
            return invalid("sink_attempts", "must be at least 1");
        }
        for (i, gate) in self.gates.iter().enumerate() {
            if !gate.min_score.is_finite() || !(0.0..=MAX_SCORE).contains(&gate.min_score) {
                return invalid("gates", "minimum score must be between 0 and 10");
            }
            if self.gates[..i].iter().any(|g| g.dimension == gate.dimension) {
                return invalid("gates", "dimension gated more than once");
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: WeightVector::default(),
            acceptance_threshold: 8.0,
            max_refinements: 1,
            gates: Vec::new(),
            max_concurrent_scenarios: 8,
            call_timeout_ms: 60_000,
            stage_timeout_ms: 180_000,
            generation_attempts: 5,
            sink_attempts: 3,
        }
    }
}

/// Complete configuration for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Scenario space
    pub scenarios: ScenarioConfig,
    /// Directory for JSON-lines output
    pub output_dir: PathBuf,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            scenarios: ScenarioConfig::default(),
            output_dir: PathBuf::from("output"),
            log_level: "info".to_string(),
        }
    }
}

impl RunConfig {
    /// Load from a `.toml`, `.yaml` or `.yml` file and validate
    ///
    /// # Errors
    /// - `ConfigurationError::Read` if the file cannot be read
    /// - `ConfigurationError::Parse` for malformed content or an unknown extension
    /// - any validation error from [`EngineConfig::validate`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: shown.clone(),
            source,
        })?;

        let parse_error = |message: String| ConfigurationError::Parse {
            path: shown.clone(),
            message,
        };
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw).map_err(|e| parse_error(e.to_string()))?,
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&raw).map_err(|e| parse_error(e.to_string()))?
            }
            other => {
                return Err(parse_error(format!(
                    "unsupported config extension {other:?}, expected toml, yaml or yml"
                )))
            }
        };

        config.engine.validate()?;
        tracing::debug!(path = %shown, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_reference_settings() {
        let config = EngineConfig::default();
        assert_eq!(config.acceptance_threshold, 8.0);
        assert_eq!(config.max_refinements, 1);
        assert_eq!(config.generation_attempts, 5);
        assert!(config.gates.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::new()
            .with_threshold(7.5)
            .with_max_concurrent(2)
            .with_call_timeout(Duration::from_millis(250));
        assert_eq!(config.acceptance_threshold, 7.5);
        assert_eq!(config.max_concurrent_scenarios, 2);
        assert_eq!(config.call_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn validate_rejects_out_of_range_settings() {
        let bad_threshold = EngineConfig::new().with_threshold(11.0);
        assert!(matches!(
            bad_threshold.validate(),
            Err(ConfigurationError::InvalidSetting { field: "acceptance_threshold", .. })
        ));

        let no_workers = EngineConfig::new().with_max_concurrent(0);
        assert!(no_workers.validate().is_err());

        let duplicate_gate = EngineConfig::new()
            .with_gate(Dimension::RatioMatch, 5.0)
            .with_gate(Dimension::RatioMatch, 6.0);
        assert!(matches!(
            duplicate_gate.validate(),
            Err(ConfigurationError::InvalidSetting { field: "gates", .. })
        ));
    }

    #[test]
    fn missing_score_fails_gate() {
        let config = EngineConfig::new()
            .with_gate(Dimension::RatioMatch, 5.0)
            .with_gate(Dimension::SocioCultural, 6.0);
        let scores = DimensionScores {
            fluency: Some(9.0),
            naturalness: Some(9.0),
            ratio_match: Some(4.0),
            socio_cultural: None,
        };
        assert_eq!(
            config.failed_gates(&scores),
            vec![Dimension::RatioMatch, Dimension::SocioCultural]
        );
    }

    #[test]
    fn loads_toml() {
        let file = write_config(
            ".toml",
            r#"
output_dir = "out"

[engine]
acceptance_threshold = 7.0
max_refinements = 2

[[engine.gates]]
dimension = "ratio_match"
min_score = 5.0

[scenarios]
first_language = "Hindi"
second_language = "English"
topic = ["travel", "music"]
"#,
        );
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.acceptance_threshold, 7.0);
        assert_eq!(config.engine.max_refinements, 2);
        assert_eq!(config.engine.gates.len(), 1);
        assert_eq!(config.engine.weights, WeightVector::default());
        assert_eq!(config.scenarios.first_language, "Hindi");
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn loads_yaml() {
        let file = write_config(
            ".yaml",
            "engine:\n  max_concurrent_scenarios: 3\nscenarios:\n  cs_ratio: [\"10%\", \"40%\"]\n",
        );
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.max_concurrent_scenarios, 3);
        assert_eq!(config.scenarios.first_language, "Arabic");
    }

    #[test]
    fn load_rejects_invalid_weights() {
        let file = write_config(
            ".toml",
            "[engine.weights]\nfluency = 0.5\nnaturalness = 0.5\nratio_match = 0.5\nsocio_cultural = 0.5\n",
        );
        assert!(matches!(
            RunConfig::load(file.path()),
            Err(ConfigurationError::Parse { .. })
        ));
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let file = write_config(".ini", "x = 1");
        assert!(matches!(
            RunConfig::load(file.path()),
            Err(ConfigurationError::Parse { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            RunConfig::load("/nonexistent/switchgen.toml"),
            Err(ConfigurationError::Read { .. })
        ));
    }
}
