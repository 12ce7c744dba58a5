//! Tracing subscriber setup for the binary

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Subscriber initialisation errors
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Configured filter does not parse
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        /// Filter as configured
        value: String,
        /// Parser error
        #[source]
        source: ParseError,
    },

    /// A global subscriber is already installed
    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// Install a compact stderr subscriber
///
/// `RUST_LOG` takes precedence; `level` is used when it is unset or invalid.
///
/// # Errors
/// `TelemetryError` if `level` is not a valid filter or a subscriber is
/// already installed.
pub fn init(level: &str) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|source| TelemetryError::EnvFilter {
            value: level.to_string(),
            source,
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
