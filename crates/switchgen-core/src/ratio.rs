//! Deterministic code-switching ratio calculator
//!
//! Counts matrix and embedded language words by inspecting the first
//! alphabetic character of every whitespace-separated token against a fixed
//! table of Unicode blocks, then scores the embedded share against the target.
//!
//! First-character classification is exact for languages with disjoint
//! scripts and imprecise for borrowings or mixed-script tokens. Two languages
//! sharing a script (e.g. English and Spanish) cannot be separated: every
//! token lands in the matrix bucket and the breakdown is flagged
//! `same_script`.

use crate::types::TargetRatio;
use serde::{Deserialize, Serialize};

/// Highest score a dimension can receive
pub const MAX_SCORE: f64 = 10.0;

/// Points lost per percentage point of deviation from the target
pub const PENALTY_PER_POINT: f64 = 0.5;

/// Inclusive range of Unicode scalar values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptRange {
    /// First code point
    pub start: u32,
    /// Last code point (inclusive)
    pub end: u32,
}

impl ScriptRange {
    /// Create a new range
    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check whether a character falls in this range
    #[inline]
    #[must_use]
    pub fn contains(self, c: char) -> bool {
        (self.start..=self.end).contains(&u32::from(c))
    }
}

/// Basic Latin + Latin-1; default for Latin-script and unregistered languages
pub const LATIN: ScriptRange = ScriptRange::new(0x0000, 0x00FF);

const SCRIPT_TABLE: &[(&str, ScriptRange)] = &[
    ("arabic", ScriptRange::new(0x0600, 0x06FF)),
    ("chinese", ScriptRange::new(0x4E00, 0x9FFF)),
    ("hindi", ScriptRange::new(0x0900, 0x097F)),
    ("japanese", ScriptRange::new(0x3040, 0x309F)),
    ("bengali", ScriptRange::new(0x0980, 0x09FF)),
    ("thai", ScriptRange::new(0x0E00, 0x0E7F)),
    ("korean", ScriptRange::new(0xAC00, 0xD7AF)),
    ("russian", ScriptRange::new(0x0400, 0x04FF)),
    ("english", LATIN),
    ("french", LATIN),
    ("spanish", LATIN),
    ("german", LATIN),
    ("vietnamese", LATIN),
];

/// Look up the script range for a language name (case-insensitive)
///
/// Unregistered languages fall back to [`LATIN`].
#[must_use]
pub fn script_range(language: &str) -> ScriptRange {
    let language = language.trim();
    SCRIPT_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(language))
        .map_or(LATIN, |(_, range)| *range)
}

/// Classification of a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Leading character in the matrix language range
    Matrix,
    /// Leading character in the embedded language range
    Embedded,
    /// Leading character in neither range
    Unknown,
}

/// Classify a token by its first alphabetic character
///
/// Returns `None` for tokens with no alphabetic characters (punctuation,
/// digits). The matrix range is checked before the embedded range.
#[must_use]
pub fn classify_token(token: &str, matrix: ScriptRange, embedded: ScriptRange) -> Option<TokenClass> {
    let first = token.chars().find(|c| c.is_alphabetic())?;
    Some(if matrix.contains(first) {
        TokenClass::Matrix
    } else if embedded.contains(first) {
        TokenClass::Embedded
    } else {
        TokenClass::Unknown
    })
}

/// Word counts and percentages for one body of generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioBreakdown {
    /// Words attributed to the matrix language
    pub matrix_words: usize,
    /// Words attributed to the embedded language
    pub embedded_words: usize,
    /// Alphabetic words in neither script
    pub unknown_words: usize,
    /// `matrix_words + embedded_words`
    pub total_words: usize,
    /// Matrix share of classified words, in percent
    pub matrix_percent: f64,
    /// Embedded share of classified words, in percent
    pub embedded_percent: f64,
    /// Both languages resolve to the same script range
    pub same_script: bool,
    /// Human-readable ratio, embedded language first
    pub computed_ratio: String,
    /// One-sentence description of the counts
    pub details: String,
}

/// Count matrix and embedded words across all text units
pub fn compute_ratio<I, S>(texts: I, matrix_language: &str, embedded_language: &str) -> RatioBreakdown
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let matrix = script_range(matrix_language);
    let embedded = script_range(embedded_language);

    let mut matrix_words = 0usize;
    let mut embedded_words = 0usize;
    let mut unknown_words = 0usize;

    for text in texts {
        for token in text.as_ref().split_whitespace() {
            match classify_token(token, matrix, embedded) {
                Some(TokenClass::Matrix) => matrix_words += 1,
                Some(TokenClass::Embedded) => embedded_words += 1,
                Some(TokenClass::Unknown) => unknown_words += 1,
                None => {}
            }
        }
    }

    let total_words = matrix_words + embedded_words;
    let same_script = matrix == embedded;

    if total_words == 0 {
        return RatioBreakdown {
            matrix_words: 0,
            embedded_words: 0,
            unknown_words,
            total_words: 0,
            matrix_percent: 0.0,
            embedded_percent: 0.0,
            same_script,
            computed_ratio: "0% : 0%".to_string(),
            details: "No words detected in text.".to_string(),
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let (matrix_percent, embedded_percent) = (
        matrix_words as f64 / total_words as f64 * 100.0,
        embedded_words as f64 / total_words as f64 * 100.0,
    );

    RatioBreakdown {
        matrix_words,
        embedded_words,
        unknown_words,
        total_words,
        matrix_percent,
        embedded_percent,
        same_script,
        computed_ratio: format!(
            "{embedded_percent:.1}% {embedded_language} : {matrix_percent:.1}% {matrix_language}"
        ),
        details: format!(
            "Counted {matrix_words} {matrix_language} words and {embedded_words} {embedded_language} words."
        ),
    }
}

/// Score how close the actual embedded share is to the target
///
/// Half a point is lost per percentage point of deviation; the result is
/// clamped to `0.0..=10.0`.
#[inline]
#[must_use]
pub fn ratio_score(actual_percent: f64, target_percent: f64) -> f64 {
    let diff = (actual_percent - target_percent).abs();
    (MAX_SCORE - diff * PENALTY_PER_POINT).clamp(0.0, MAX_SCORE)
}

/// Breakdown plus score against a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioAssessment {
    /// Counted words and percentages
    pub breakdown: RatioBreakdown,
    /// Target the text was scored against
    pub target: TargetRatio,
    /// Match score in `0.0..=10.0`
    pub score: f64,
}

/// Stateless entry point bundling counting and scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioCalculator;

impl RatioCalculator {
    /// Count and score generated text against a target ratio
    pub fn assess<I, S>(
        texts: I,
        matrix_language: &str,
        embedded_language: &str,
        target: TargetRatio,
    ) -> RatioAssessment
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let breakdown = compute_ratio(texts, matrix_language, embedded_language);
        let score = ratio_score(breakdown.embedded_percent, target.percent());
        RatioAssessment {
            breakdown,
            target,
            score,
        }
    }
}
