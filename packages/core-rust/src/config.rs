use std::path::PathBuf;

use crate::catalog::{Operations, OPERATIONS_KEY};

/// Errors raised by a configuration accessor.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config key not found: {key}")]
    NotFound { key: String },
    #[error("config key {key} has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Key/value configuration accessor consulted on every dispatch.
pub trait ConfigHandler: Send + Sync {
    /// Returns the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when nothing is stored under `key`.
    fn get_object(&self, key: &str) -> Result<serde_json::Value, ConfigError>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Implementations backed by fallible storage report write failures here.
    fn set_object(&self, key: &str, value: serde_json::Value) -> Result<(), ConfigError>;
}

/// Loads and decodes the operations table.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the table is absent and
/// `ConfigError::Decode` if it does not decode as an [`Operations`] map.
pub fn load_operations(config: &dyn ConfigHandler) -> Result<Operations, ConfigError> {
    let value = config.get_object(OPERATIONS_KEY)?;
    let operations: Operations =
        serde_json::from_value(value).map_err(|source| ConfigError::Decode {
            key: OPERATIONS_KEY.to_string(),
            source,
        })?;
    tracing::trace!(operations = operations.len(), "loaded operations table");
    Ok(operations)
}
