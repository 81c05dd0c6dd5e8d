//! HTTP surface configuration.

use std::time::Duration;

/// Port the adapter listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 10004;

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Maximum time to produce a response. Streaming bodies are not limited.
    pub request_timeout: Duration,
    /// How long shutdown waits for accepted operations to report.
    pub drain_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
        }
    }
}
