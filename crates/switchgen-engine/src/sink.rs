//! Result sinks
//!
//! A sink receives every accepted scenario exactly once from the
//! orchestrator's point of view; a failed delivery is retried, so sinks must
//! tolerate at-least-once delivery.

use crate::error::SinkError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use switchgen_core::CompletedScenario;
use tokio::io::AsyncWriteExt;

/// Destination for accepted scenarios
///
/// Called concurrently from many workflows.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist one accepted scenario
    async fn deliver(&self, scenario: &CompletedScenario) -> Result<(), SinkError>;
}

/// In-process sink collecting scenarios in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    scenarios: Mutex<Vec<CompletedScenario>>,
}

impl MemorySink {
    /// Create an empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered scenarios
    #[must_use]
    pub fn scenarios(&self) -> Vec<CompletedScenario> {
        self.scenarios.lock().clone()
    }

    /// Number of delivered scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.lock().len()
    }

    /// Nothing delivered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.lock().is_empty()
    }
}

#[async_trait::async_trait]
impl ResultSink for MemorySink {
    async fn deliver(&self, scenario: &CompletedScenario) -> Result<(), SinkError> {
        self.scenarios.lock().push(scenario.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to `<dir>/<first_language>.jsonl`
#[derive(Debug)]
pub struct JsonlSink {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlSink {
    /// Create the output directory if needed
    ///
    /// # Errors
    /// `SinkError::Io` if the directory cannot be created.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Output directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that scenarios with this matrix language are appended to
    #[must_use]
    pub fn path_for(&self, first_language: &str) -> PathBuf {
        let stem: String = first_language
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() { "unknown".to_string() } else { stem };
        self.dir.join(format!("{stem}.jsonl"))
    }
}

#[async_trait::async_trait]
impl ResultSink for JsonlSink {
    async fn deliver(&self, scenario: &CompletedScenario) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(scenario)?;
        line.push('\n');
        let path = self.path_for(&scenario.parameters().first_language);

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        tracing::debug!(scenario = %scenario.id(), path = %path.display(), "scenario written");
        Ok(())
    }
}
