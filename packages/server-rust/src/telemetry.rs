//! Structured logging initialisation for the adapter binary.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-filter` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line, fields flattened.
    #[default]
    Json,
    /// Human-readable single-line output.
    Compact,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive string.
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first call; later calls are no-ops.
///
/// # Errors
///
/// Returns `TelemetryError::Filter` for an unparsable filter and
/// `TelemetryError::Subscriber` if another subscriber is already installed.
pub fn initialise(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| ())
}

fn install_subscriber(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = parse_filter(&config.filter)?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.format {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|err| TelemetryError::Filter(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(parse_filter(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let err = parse_filter("nsm_adapter=loudest").unwrap_err();
        assert!(matches!(err, TelemetryError::Filter(_)));
    }

    #[test]
    fn defaults_to_json() {
        let config = TelemetryConfig::default();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, DEFAULT_LOG_FILTER);
    }
}
