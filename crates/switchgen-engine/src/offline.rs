//! Scripted collaborators for offline dry runs
//!
//! [`ScriptedGenerator`] writes a short sample that mixes words from small
//! per-language vocabularies at the scenario's target ratio, and
//! [`ScriptedJudge`] returns a fixed score. Together they exercise the whole
//! engine without any model backend.

use crate::collaborators::{
    GenerationRequest, Generator, Judge, JudgePanel, JudgeRequest, Judgement,
};
use crate::error::{EvaluationError, GenerationError};
use std::sync::Arc;

const SAMPLE_WORDS: usize = 20;

const VOCABULARY: &[(&str, &[&str])] = &[
    ("arabic", &["كانت", "المباراة", "رائعة", "جدا", "اليوم", "في", "الملعب", "الفريق"]),
    ("chinese", &["今天", "比赛", "非常", "精彩", "我们", "球队", "赢了"]),
    ("hindi", &["आज", "खेल", "बहुत", "अच्छा", "था", "हमारी", "टीम"]),
    ("japanese", &["きょう", "しあい", "とても", "たのしい", "でした"]),
    ("bengali", &["আজ", "খেলা", "খুব", "ভালো", "ছিল"]),
    ("thai", &["วันนี้", "การแข่งขัน", "สนุก", "มาก"]),
    ("korean", &["오늘", "경기", "정말", "재미있었어요"]),
    ("russian", &["сегодня", "матч", "был", "очень", "интересным"]),
];

const LATIN_WORDS: &[&str] = &["the", "match", "was", "really", "great", "today", "team", "won"];

fn vocabulary(language: &str) -> &'static [&'static str] {
    let language = language.trim();
    VOCABULARY
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(language))
        .map_or(LATIN_WORDS, |(_, words)| *words)
}

/// Deterministic generator hitting the target ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedGenerator;

#[async_trait::async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError> {
        let parameters = request.parameters;
        let matrix = vocabulary(&parameters.first_language);
        let embedded = vocabulary(&parameters.second_language);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let embedded_count =
            (parameters.cs_ratio.percent() / 100.0 * SAMPLE_WORDS as f64).round() as usize;

        let words: Vec<&str> = (0..SAMPLE_WORDS)
            .map(|i| {
                // spread embedded words evenly through the sample
                let before = i * embedded_count / SAMPLE_WORDS;
                let through = (i + 1) * embedded_count / SAMPLE_WORDS;
                if through > before {
                    embedded[i % embedded.len()]
                } else {
                    matrix[i % matrix.len()]
                }
            })
            .collect();

        Ok(vec![words.join(" ")])
    }
}

/// Judge returning the same score for everything
#[derive(Debug, Clone, Copy)]
pub struct ScriptedJudge {
    score: f64,
}

impl ScriptedJudge {
    /// Create a judge with a fixed score
    #[inline]
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

#[async_trait::async_trait]
impl Judge for ScriptedJudge {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<Judgement, EvaluationError> {
        let summary = match request.ratio {
            Some(ratio) => format!(
                "Offline review: {} against a {} target.",
                ratio.breakdown.computed_ratio, ratio.target
            ),
            None => format!("Offline {} review.", request.dimension),
        };
        Ok(Judgement {
            score: self.score,
            detail: serde_json::json!({ "source": "offline", "dimension": request.dimension }),
            summary,
        })
    }
}

/// Panel of scripted judges, including a ratio advisor
#[must_use]
pub fn scripted_panel(score: f64) -> JudgePanel {
    let judge = Arc::new(ScriptedJudge::new(score));
    JudgePanel::uniform(judge.clone()).with_ratio_advisor(judge)
}
