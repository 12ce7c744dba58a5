//! Scenario orchestrator
//!
//! Streams scenario parameters through independent workflows with bounded
//! concurrency, delivers accepted scenarios to the sink and tallies the run.
//! Parameters are pulled lazily, so the scenario space is never
//! materialised.
//!
//! # Cancellation
//!
//! A [`ShutdownHandle`] stops the run: no further scenarios are pulled,
//! in-flight workflows are abandoned at their next suspension point and
//! nothing non-terminal reaches the sink. A delivery that already started
//! runs to completion.

use crate::collaborators::{Generator, JudgePanel};
use crate::error::EngineError;
use crate::sink::ResultSink;
use crate::workflow::{Workflow, WorkflowOutcome};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use switchgen_core::{
    expand, AcceptanceOutcome, CompletedScenario, ConfigurationError, EngineConfig,
    FailedScenario, ScenarioConfig, ScenarioId, ScenarioParameters,
};
use tokio::sync::watch;
use tokio::time::timeout;

/// Cloneable trigger that stops a running orchestrator
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signal shutdown
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    /// Whether shutdown has been signalled
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Accepted scenario whose delivery kept failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndeliveredScenario {
    /// Run identifier
    pub id: ScenarioId,
    /// Parameter label
    pub label: String,
    /// Last sink error
    pub reason: String,
}

/// Result of one scenario as seen by the orchestrator
#[derive(Debug, Clone)]
pub enum ScenarioOutcome {
    /// Accepted; delivered unless `undelivered` is set
    Accepted {
        /// Run identifier
        id: ScenarioId,
        /// Acceptance reason
        outcome: AcceptanceOutcome,
        /// Final evaluation was partial
        partial: bool,
        /// Set when every delivery attempt failed
        undelivered: Option<UndeliveredScenario>,
    },
    /// Generation failed
    Failed(FailedScenario),
    /// Abandoned on shutdown
    Cancelled,
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Accepted at or above the threshold
    pub met_threshold: usize,
    /// Accepted after the refinement budget ran out
    pub refinement_exhausted: usize,
    /// Accepted with at least one dimension missing
    pub partial: usize,
    /// Failed scenarios
    pub failed: Vec<FailedScenario>,
    /// Scenarios abandoned on shutdown
    pub cancelled: usize,
    /// Accepted scenarios the sink never took
    pub undelivered: Vec<UndeliveredScenario>,
}

impl RunReport {
    /// Total accepted scenarios
    #[inline]
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.met_threshold + self.refinement_exhausted
    }

    /// Total scenarios that reached any outcome, including cancellation
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.accepted() + self.failed.len() + self.cancelled
    }

    /// Fold one scenario outcome into the report
    pub fn record(&mut self, outcome: ScenarioOutcome) {
        match outcome {
            ScenarioOutcome::Accepted {
                outcome,
                partial,
                undelivered,
                ..
            } => {
                match outcome {
                    AcceptanceOutcome::MetThreshold => self.met_threshold += 1,
                    AcceptanceOutcome::RefinementExhausted { .. } => {
                        self.refinement_exhausted += 1;
                    }
                }
                if partial {
                    self.partial += 1;
                }
                self.undelivered.extend(undelivered);
            }
            ScenarioOutcome::Failed(failed) => self.failed.push(failed),
            ScenarioOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

/// Drives many scenarios concurrently
pub struct Orchestrator {
    config: Arc<EngineConfig>,
    workflow: Workflow,
    sink: Arc<dyn ResultSink>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Orchestrator {
    /// Create an orchestrator
    ///
    /// # Errors
    /// `ConfigurationError` if `config` fails validation.
    pub fn new(
        config: EngineConfig,
        generator: Arc<dyn Generator>,
        judges: JudgePanel,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let config = Arc::new(config);
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            workflow: Workflow::new(config.clone(), generator, judges),
            config,
            sink,
            shutdown: Arc::new(shutdown),
        })
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle that stops this orchestrator
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: self.shutdown.clone(),
        }
    }

    /// Expand a scenario configuration and run every scenario
    ///
    /// # Errors
    /// `EngineError::Configuration` if expansion fails; nothing runs then.
    pub async fn run_config(&self, scenarios: &ScenarioConfig) -> Result<RunReport, EngineError> {
        let iter = expand(scenarios)?;
        tracing::info!(scenarios = iter.len(), "starting run");
        Ok(self.run(iter).await)
    }

    /// Run every scenario in `scenarios`
    pub async fn run<I>(&self, scenarios: I) -> RunReport
    where
        I: IntoIterator<Item = ScenarioParameters>,
        I::IntoIter: Send,
    {
        let limit = self.config.max_concurrent_scenarios;
        let mut stopped = self.shutdown.subscribe();

        let report = stream::iter(scenarios)
            .take_until(async move { cancelled(&mut stopped).await })
            .map(|parameters| self.run_scenario(parameters))
            .buffer_unordered(limit)
            .fold(RunReport::default(), |mut report, outcome| async move {
                report.record(outcome);
                report
            })
            .await;

        tracing::info!(
            accepted = report.accepted(),
            met_threshold = report.met_threshold,
            refinement_exhausted = report.refinement_exhausted,
            partial = report.partial,
            failed = report.failed.len(),
            cancelled = report.cancelled,
            undelivered = report.undelivered.len(),
            "run finished"
        );
        report
    }

    /// Run one scenario and deliver it if accepted
    pub async fn run_scenario(&self, parameters: ScenarioParameters) -> ScenarioOutcome {
        let mut stopped = self.shutdown.subscribe();
        if *stopped.borrow_and_update() {
            return ScenarioOutcome::Cancelled;
        }

        let outcome = tokio::select! {
            outcome = self.workflow.run(parameters) => outcome,
            () = cancelled(&mut stopped) => {
                tracing::info!("scenario abandoned on shutdown");
                return ScenarioOutcome::Cancelled;
            }
        };

        match outcome {
            WorkflowOutcome::Accepted(completed) => self.deliver(completed).await,
            WorkflowOutcome::Failed(failed) => ScenarioOutcome::Failed(failed),
        }
    }

    async fn deliver(&self, scenario: CompletedScenario) -> ScenarioOutcome {
        let attempts = self.config.sink_attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let error = match timeout(self.config.call_timeout(), self.sink.deliver(&scenario)).await {
                Ok(Ok(())) => {
                    last_error = None;
                    break;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("sink timed out after {}ms", self.config.call_timeout_ms),
            };
            tracing::warn!(scenario = %scenario.id(), attempt, attempts, %error, "delivery failed");
            last_error = Some(error);
        }

        let undelivered = last_error.map(|reason| {
            tracing::error!(scenario = %scenario.id(), %reason, "scenario could not be delivered");
            UndeliveredScenario {
                id: scenario.id(),
                label: scenario.parameters().label(),
                reason,
            }
        });

        ScenarioOutcome::Accepted {
            id: scenario.id(),
            outcome: scenario.outcome().clone(),
            partial: scenario.is_partial(),
            undelivered,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("shutdown", &*self.shutdown.borrow())
            .finish_non_exhaustive()
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone
async fn cancelled(receiver: &mut watch::Receiver<bool>) {
    while !*receiver.borrow_and_update() {
        if receiver.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tallies_outcomes() {
        let mut report = RunReport::default();
        report.record(ScenarioOutcome::Accepted {
            id: ScenarioId::new(),
            outcome: AcceptanceOutcome::MetThreshold,
            partial: true,
            undelivered: None,
        });
        report.record(ScenarioOutcome::Accepted {
            id: ScenarioId::new(),
            outcome: AcceptanceOutcome::RefinementExhausted {
                failed_gates: Vec::new(),
            },
            partial: false,
            undelivered: Some(UndeliveredScenario {
                id: ScenarioId::new(),
                label: "x".into(),
                reason: "disk full".into(),
            }),
        });
        report.record(ScenarioOutcome::Cancelled);

        assert_eq!(report.accepted(), 2);
        assert_eq!(report.partial, 1);
        assert_eq!(report.undelivered.len(), 1);
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn cancelled_resolves_after_signal() {
        let (sender, mut receiver) = watch::channel(false);
        let waiter = tokio::spawn(async move { cancelled(&mut receiver).await });
        sender.send_replace(true);
        waiter.await.unwrap();
    }
}
