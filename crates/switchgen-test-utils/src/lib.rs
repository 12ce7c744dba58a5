//! Testing utilities for the Switchgen workspace
//!
//! Scripted generators, judges and sinks plus scenario fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use switchgen_core::{
    expand_all, Axis, CompletedScenario, EngineConfig, ScenarioConfig, ScenarioParameters,
};
use switchgen_engine::{
    EvaluationError, GenerationError, GenerationRequest, Generator, Judge, JudgePanel,
    JudgeRequest, Judgement, MemorySink, Orchestrator, ResultSink, SinkError,
};

/// Default Arabic/English sports scenario, 30% target
pub fn sample_parameters() -> ScenarioParameters {
    expand_all(&ScenarioConfig::default()).unwrap().remove(0)
}

/// Scenario space with `n` topics and everything else fixed
pub fn scenario_config(n: usize) -> ScenarioConfig {
    ScenarioConfig {
        topic: Axis::Many((0..n).map(|i| format!("topic-{i}")).collect()),
        ..ScenarioConfig::default()
    }
}

/// 7 Arabic and 3 English words: exactly 30% embedded
pub fn on_target_text() -> Vec<String> {
    vec!["كانت المباراة رائعة جدا اليوم في الملعب really great game".to_string()]
}

/// Arabic only: 0% embedded
pub fn matrix_only_text() -> Vec<String> {
    vec!["كانت المباراة رائعة جدا اليوم في الملعب".to_string()]
}

/// Replays scripted responses, then fails
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    responses: Mutex<Vec<Result<Vec<String>, GenerationError>>>,
    feedback: Mutex<Vec<Option<String>>>,
}

impl SequenceGenerator {
    pub fn new(mut responses: Vec<Result<Vec<String>, GenerationError>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            feedback: Mutex::new(Vec::new()),
        }
    }

    /// Number of generator calls so far
    pub fn calls(&self) -> usize {
        self.feedback.lock().len()
    }

    /// Feedback summary received by each call
    pub fn feedback(&self) -> Vec<Option<String>> {
        self.feedback.lock().clone()
    }
}

#[async_trait::async_trait]
impl Generator for SequenceGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError> {
        self.feedback
            .lock()
            .push(request.feedback.map(|f| f.summary.clone()));
        self.responses
            .lock()
            .pop()
            .unwrap_or_else(|| Err(GenerationError::Failed("script exhausted".into())))
    }
}

/// Always returns the same text
#[derive(Debug, Clone)]
pub struct FixedGenerator(pub Vec<String>);

#[async_trait::async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError> {
        Ok(self.0.clone())
    }
}

/// Records the peak number of concurrent calls
#[derive(Debug)]
pub struct TrackingGenerator {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TrackingGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Generator for TrackingGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(on_target_text())
    }
}

/// Never completes; counts how many calls started
#[derive(Debug, Default)]
pub struct StallingGenerator {
    started: AtomicUsize,
}

impl StallingGenerator {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Generator for StallingGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<Vec<String>, GenerationError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Returns a fixed score
#[derive(Debug, Clone, Copy)]
pub struct FixedJudge(pub f64);

#[async_trait::async_trait]
impl Judge for FixedJudge {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<Judgement, EvaluationError> {
        Ok(Judgement {
            score: self.0,
            detail: serde_json::json!({ "dimension": request.dimension }),
            summary: format!("{} scored {}", request.dimension, self.0),
        })
    }
}

/// Returns a different score on every call, in order, then repeats the last
#[derive(Debug)]
pub struct SequenceJudge {
    scores: Vec<f64>,
    calls: AtomicUsize,
}

impl SequenceJudge {
    pub fn new(scores: Vec<f64>) -> Self {
        assert!(!scores.is_empty(), "at least one score required");
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Judge for SequenceJudge {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<Judgement, EvaluationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let score = self.scores[call.min(self.scores.len() - 1)];
        FixedJudge(score).judge(request).await
    }
}

/// Always fails
#[derive(Debug, Clone, Copy)]
pub struct FailingJudge;

#[async_trait::async_trait]
impl Judge for FailingJudge {
    async fn judge(&self, _request: JudgeRequest<'_>) -> Result<Judgement, EvaluationError> {
        Err(EvaluationError::Failed("judge unavailable".into()))
    }
}

/// Same judge on every judged dimension
pub fn uniform_panel(score: f64) -> JudgePanel {
    JudgePanel::uniform(Arc::new(FixedJudge(score)))
}

/// Rejects the first `failures` deliveries, then stores like a memory sink
#[derive(Debug)]
pub struct FlakySink {
    failures: AtomicUsize,
    attempts: AtomicUsize,
    inner: MemorySink,
}

impl FlakySink {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
            inner: MemorySink::new(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<CompletedScenario> {
        self.inner.scenarios()
    }
}

#[async_trait::async_trait]
impl ResultSink for FlakySink {
    async fn deliver(&self, scenario: &CompletedScenario) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SinkError::Rejected("scripted rejection".into()));
        }
        self.inner.deliver(scenario).await
    }
}

/// Orchestrator writing into a fresh memory sink
pub fn setup_orchestrator(
    config: EngineConfig,
    generator: Arc<dyn Generator>,
    judges: JudgePanel,
) -> (Orchestrator, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let orchestrator = Orchestrator::new(config, generator, judges, sink.clone()).unwrap();
    (orchestrator, sink)
}
