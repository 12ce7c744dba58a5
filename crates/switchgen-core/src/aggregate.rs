//! Weighted score aggregation
//!
//! Combines the four dimension scores into one scalar. When a judged
//! dimension is missing the aggregate is the weighted mean over the
//! dimensions that are present, and the result is flagged partial.

use crate::error::ConfigurationError;
use crate::types::Dimension;
use serde::{Deserialize, Serialize};

/// Allowed deviation of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-dimension weights; non-negative and summing to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights")]
pub struct WeightVector {
    fluency: f64,
    naturalness: f64,
    ratio_match: f64,
    socio_cultural: f64,
}

#[derive(Deserialize)]
struct RawWeights {
    fluency: f64,
    naturalness: f64,
    ratio_match: f64,
    socio_cultural: f64,
}

impl TryFrom<RawWeights> for WeightVector {
    type Error = ConfigurationError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        Self::new(raw.fluency, raw.naturalness, raw.ratio_match, raw.socio_cultural)
    }
}

impl WeightVector {
    /// Create a validated weight vector
    ///
    /// # Errors
    /// - `ConfigurationError::NegativeWeight` for a negative or non-finite component
    /// - `ConfigurationError::WeightSum` if the components do not sum to 1.0
    pub fn new(
        fluency: f64,
        naturalness: f64,
        ratio_match: f64,
        socio_cultural: f64,
    ) -> Result<Self, ConfigurationError> {
        let weights = Self {
            fluency,
            naturalness,
            ratio_match,
            socio_cultural,
        };
        for dimension in Dimension::ALL {
            let value = weights.weight(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::NegativeWeight {
                    dimension: dimension.name(),
                    value,
                });
            }
        }
        let sum = fluency + naturalness + ratio_match + socio_cultural;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSum { sum });
        }
        Ok(weights)
    }

    /// Weight of one dimension
    #[inline]
    #[must_use]
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Fluency => self.fluency,
            Dimension::Naturalness => self.naturalness,
            Dimension::RatioMatch => self.ratio_match,
            Dimension::SocioCultural => self.socio_cultural,
        }
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            fluency: 0.30,
            naturalness: 0.25,
            ratio_match: 0.20,
            socio_cultural: 0.25,
        }
    }
}

/// Dimension scores feeding the aggregator; `None` marks a missing dimension
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DimensionScores {
    /// Fluency score
    pub fluency: Option<f64>,
    /// Naturalness score
    pub naturalness: Option<f64>,
    /// Ratio-match score
    pub ratio_match: Option<f64>,
    /// Socio-cultural score
    pub socio_cultural: Option<f64>,
}

impl DimensionScores {
    /// All four scores present
    #[inline]
    #[must_use]
    pub fn complete(fluency: f64, naturalness: f64, ratio_match: f64, socio_cultural: f64) -> Self {
        Self {
            fluency: Some(fluency),
            naturalness: Some(naturalness),
            ratio_match: Some(ratio_match),
            socio_cultural: Some(socio_cultural),
        }
    }

    /// Score of one dimension, if present
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Fluency => self.fluency,
            Dimension::Naturalness => self.naturalness,
            Dimension::RatioMatch => self.ratio_match,
            Dimension::SocioCultural => self.socio_cultural,
        }
    }
}

/// Aggregate score with completeness metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    /// Weighted score in `0.0..=10.0`
    pub value: f64,
    /// At least one dimension was missing
    pub partial: bool,
    /// Dimensions excluded from the computation
    pub missing: Vec<Dimension>,
}

/// Combine dimension scores with a weight vector
#[must_use]
pub fn aggregate(scores: &DimensionScores, weights: &WeightVector) -> AggregateScore {
    let mut weighted = 0.0;
    let mut weight_present = 0.0;
    let mut missing = Vec::new();

    for dimension in Dimension::ALL {
        match scores.get(dimension) {
            Some(score) => {
                let weight = weights.weight(dimension);
                weighted += score * weight;
                weight_present += weight;
            }
            None => missing.push(dimension),
        }
    }

    if missing.is_empty() {
        return AggregateScore {
            value: weighted,
            partial: false,
            missing,
        };
    }

    let value = if weight_present > 0.0 {
        weighted / weight_present
    } else {
        0.0
    };

    AggregateScore {
        value,
        partial: true,
        missing,
    }
}
