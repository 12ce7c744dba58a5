//! Scenario expansion
//!
//! Expands a configuration of named axes into the Cartesian product of
//! scenario parameter records. Axes are walked in a fixed declared order and
//! the last axis varies fastest, so expanding the same configuration twice
//! yields the same sequence.
//!
//! Expansion is lazy: [`ScenarioIter`] produces one record at a time, which
//! lets the orchestrator stream scenario spaces in the thousands without
//! materialising them.

use crate::error::ConfigurationError;
use crate::types::{ScenarioParameters, SpeakerProfile, TargetRatio};
use serde::{Deserialize, Serialize};

/// One configuration axis: a fixed scalar or a list of values
///
/// Config files may give numeric values (`cs_ratio = 30`); they are kept as
/// their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Axis {
    /// Scalar held fixed across every scenario
    One(String),
    /// Values to enumerate
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawValue> for String {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Text(text) => text,
            RawValue::Integer(n) => n.to_string(),
            RawValue::Float(x) => x.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAxis {
    One(RawValue),
    Many(Vec<RawValue>),
}

impl<'de> Deserialize<'de> for Axis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match RawAxis::deserialize(deserializer)? {
            RawAxis::One(value) => Axis::One(value.into()),
            RawAxis::Many(values) => Axis::Many(values.into_iter().map(String::from).collect()),
        })
    }
}

impl Axis {
    /// Values of this axis
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Axis::One(value) => std::slice::from_ref(value),
            Axis::Many(values) => values,
        }
    }
}

impl From<&str> for Axis {
    fn from(value: &str) -> Self {
        Axis::One(value.to_string())
    }
}

impl From<Vec<&str>> for Axis {
    fn from(values: Vec<&str>) -> Self {
        Axis::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Axis names in expansion order
pub const AXIS_ORDER: [&str; 10] = [
    "topic",
    "tense",
    "perspective",
    "cs_ratio",
    "cs_function",
    "cs_type",
    "gender",
    "age",
    "education_level",
    "conversation_type",
];

const CS_RATIO_AXIS: usize = 3;

/// Scenario space configuration
///
/// The language pair is constant and copied verbatim into every record.
/// Fields left out of a config file fall back to [`ScenarioConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Matrix language
    pub first_language: String,
    /// Embedded language
    pub second_language: String,
    /// Topics
    pub topic: Axis,
    /// Tenses
    pub tense: Axis,
    /// Perspectives
    pub perspective: Axis,
    /// Target embedded-language ratios, e.g. `"30%"`
    pub cs_ratio: Axis,
    /// Code-switching functions
    pub cs_function: Axis,
    /// Code-switching types
    pub cs_type: Axis,
    /// Speaker genders
    pub gender: Axis,
    /// Speaker age bands
    pub age: Axis,
    /// Speaker education levels
    pub education_level: Axis,
    /// Conversation forms
    pub conversation_type: Axis,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            first_language: "Arabic".to_string(),
            second_language: "English".to_string(),
            topic: "sports".into(),
            tense: "Present".into(),
            perspective: "Third Person".into(),
            cs_ratio: "30%".into(),
            cs_function: "Expressive".into(),
            cs_type: "Intersentential".into(),
            gender: "Female".into(),
            age: "26-35".into(),
            education_level: "College".into(),
            conversation_type: "single_turn".into(),
        }
    }
}

impl ScenarioConfig {
    fn axes(&self) -> [&Axis; 10] {
        [
            &self.topic,
            &self.tense,
            &self.perspective,
            &self.cs_ratio,
            &self.cs_function,
            &self.cs_type,
            &self.gender,
            &self.age,
            &self.education_level,
            &self.conversation_type,
        ]
    }
}

/// Validated, ready-to-iterate scenario space
#[derive(Debug, Clone)]
pub struct ScenarioExpander {
    first_language: String,
    second_language: String,
    axes: Vec<Vec<String>>,
    ratios: Vec<TargetRatio>,
    count: usize,
}

impl ScenarioExpander {
    /// Validate a configuration
    ///
    /// # Errors
    /// - `ConfigurationError::BlankField` for a blank language name
    /// - `ConfigurationError::EmptyAxis` for a list axis without values
    /// - `ConfigurationError::InvalidTargetRatio` for an unparseable ratio
    /// - `ConfigurationError::ScenarioCountOverflow` if the product overflows
    pub fn new(config: &ScenarioConfig) -> Result<Self, ConfigurationError> {
        if config.first_language.trim().is_empty() {
            return Err(ConfigurationError::BlankField("first_language"));
        }
        if config.second_language.trim().is_empty() {
            return Err(ConfigurationError::BlankField("second_language"));
        }

        let mut axes = Vec::with_capacity(AXIS_ORDER.len());
        let mut count = 1usize;
        for (name, axis) in AXIS_ORDER.into_iter().zip(config.axes()) {
            let values = axis.values();
            if values.is_empty() {
                return Err(ConfigurationError::EmptyAxis(name));
            }
            count = count
                .checked_mul(values.len())
                .ok_or(ConfigurationError::ScenarioCountOverflow)?;
            axes.push(values.to_vec());
        }

        let ratios = axes[CS_RATIO_AXIS]
            .iter()
            .map(|raw| raw.parse::<TargetRatio>())
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(scenarios = count, "scenario space validated");

        Ok(Self {
            first_language: config.first_language.trim().to_string(),
            second_language: config.second_language.trim().to_string(),
            axes,
            ratios,
            count,
        })
    }

    /// Number of scenarios (product of axis sizes)
    #[inline]
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.count
    }

    /// Lazily iterate over every scenario
    #[inline]
    #[must_use]
    pub fn iter(&self) -> ScenarioIter {
        self.clone().into_iter()
    }

    fn record(&self, indices: &[usize]) -> ScenarioParameters {
        let value = |axis: usize| self.axes[axis][indices[axis]].clone();
        ScenarioParameters {
            topic: value(0),
            tense: value(1),
            perspective: value(2),
            first_language: self.first_language.clone(),
            second_language: self.second_language.clone(),
            cs_ratio: self.ratios[indices[CS_RATIO_AXIS]],
            cs_function: value(4),
            cs_type: value(5),
            speaker: SpeakerProfile {
                gender: value(6),
                age: value(7),
                education_level: value(8),
            },
            conversation_type: value(9),
        }
    }
}

impl IntoIterator for ScenarioExpander {
    type Item = ScenarioParameters;
    type IntoIter = ScenarioIter;

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.count;
        ScenarioIter {
            indices: vec![0; self.axes.len()],
            remaining,
            expander: self,
        }
    }
}

/// Odometer over axis indices, last axis fastest
#[derive(Debug, Clone)]
pub struct ScenarioIter {
    expander: ScenarioExpander,
    indices: Vec<usize>,
    remaining: usize,
}

impl Iterator for ScenarioIter {
    type Item = ScenarioParameters;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let record = self.expander.record(&self.indices);
        self.remaining -= 1;

        for axis in (0..self.indices.len()).rev() {
            self.indices[axis] += 1;
            if self.indices[axis] < self.expander.axes[axis].len() {
                break;
            }
            self.indices[axis] = 0;
        }

        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ScenarioIter {}

/// Validate a configuration and return a lazy scenario iterator
///
/// # Errors
/// See [`ScenarioExpander::new`].
pub fn expand(config: &ScenarioConfig) -> Result<ScenarioIter, ConfigurationError> {
    Ok(ScenarioExpander::new(config)?.into_iter())
}

/// Validate a configuration and collect every scenario
///
/// # Errors
/// See [`ScenarioExpander::new`].
pub fn expand_all(config: &ScenarioConfig) -> Result<Vec<ScenarioParameters>, ConfigurationError> {
    expand(config).map(Iterator::collect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn two_by_three() -> ScenarioConfig {
        ScenarioConfig {
            topic: vec!["sports", "food"].into(),
            cs_ratio: vec!["10%", "30%", "50%"].into(),
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn produces_cartesian_product_in_declared_order() {
        let scenarios = expand_all(&two_by_three()).unwrap();
        let pairs: Vec<_> = scenarios
            .iter()
            .map(|s| (s.topic.as_str(), s.cs_ratio.percent()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("sports", 10.0),
                ("sports", 30.0),
                ("sports", 50.0),
                ("food", 10.0),
                ("food", 30.0),
                ("food", 50.0),
            ]
        );
    }

    #[test]
    fn constants_are_copied_verbatim() {
        for scenario in expand(&two_by_three()).unwrap() {
            assert_eq!(scenario.first_language, "Arabic");
            assert_eq!(scenario.second_language, "English");
            assert_eq!(scenario.speaker.age, "26-35");
        }
    }

    #[test]
    fn empty_axis_is_an_error() {
        let config = ScenarioConfig {
            tense: Axis::Many(Vec::new()),
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            ScenarioExpander::new(&config),
            Err(ConfigurationError::EmptyAxis("tense"))
        ));
    }

    #[test]
    fn invalid_ratio_is_an_error() {
        let config = ScenarioConfig {
            cs_ratio: vec!["30%", "lots"].into(),
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            ScenarioExpander::new(&config),
            Err(ConfigurationError::InvalidTargetRatio { .. })
        ));
    }

    #[test]
    fn blank_language_is_an_error() {
        let config = ScenarioConfig {
            second_language: "  ".to_string(),
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            ScenarioExpander::new(&config),
            Err(ConfigurationError::BlankField("second_language"))
        ));
    }

    #[test]
    fn iterator_reports_exact_size() {
        let expander = ScenarioExpander::new(&two_by_three()).unwrap();
        let mut iter = expander.iter();
        assert_eq!(iter.len(), 6);
        iter.next();
        assert_eq!(iter.len(), 5);
    }

    #[test]
    fn parses_from_yaml_with_scalars_and_lists() {
        let yaml = r#"
first_language: Hindi
second_language: English
topic: [travel, music]
cs_ratio: "20%"
gender: [Male, Female]
"#;
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        let expander = ScenarioExpander::new(&config).unwrap();
        assert_eq!(expander.scenario_count(), 4);
        assert_eq!(config.tense, Axis::One("Present".to_string()));
    }

    #[test]
    fn numeric_axis_values_are_accepted() {
        let config: ScenarioConfig =
            serde_yaml::from_str("cs_ratio: [10, 12.5]\ntopic: 7\n").unwrap();
        assert_eq!(config.cs_ratio, Axis::from(vec!["10", "12.5"]));
        assert_eq!(config.topic, Axis::One("7".to_string()));

        let config: ScenarioConfig = toml::from_str("cs_ratio = 30").unwrap();
        let ratios: Vec<_> = expand(&config).unwrap().map(|s| s.cs_ratio.percent()).collect();
        assert_eq!(ratios, vec![30.0]);
    }

    fn axis_strategy() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-z]{1,6}", 1..4).prop_map(|mut values| {
            values.sort();
            values.dedup();
            values
        })
    }

    proptest! {
        #[test]
        fn prop_count_is_product_and_records_distinct(
            topics in axis_strategy(),
            tenses in axis_strategy(),
            genders in axis_strategy(),
        ) {
            let config = ScenarioConfig {
                topic: Axis::Many(topics.clone()),
                tense: Axis::Many(tenses.clone()),
                gender: Axis::Many(genders.clone()),
                ..ScenarioConfig::default()
            };
            let first = expand_all(&config).unwrap();
            let second = expand_all(&config).unwrap();

            prop_assert_eq!(first.len(), topics.len() * tenses.len() * genders.len());
            prop_assert_eq!(&first, &second);

            let distinct: HashSet<_> = first
                .iter()
                .map(|s| (s.topic.clone(), s.tense.clone(), s.speaker.gender.clone()))
                .collect();
            prop_assert_eq!(distinct.len(), first.len());
        }
    }
}
