//! In-memory configuration store backing the dispatcher's metadata lookups.

use std::path::Path;

use dashmap::DashMap;
use nsm_adapter_core::catalog::OPERATIONS_KEY;
use nsm_adapter_core::{default_operations, ConfigError, ConfigHandler, Operations};
use tracing::info;

/// Concurrent key/value store of JSON values.
///
/// Reads clone the stored value, so a dispatch always works on its own
/// snapshot even if the table is replaced concurrently.
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: DashMap<String, serde_json::Value>,
}

impl ConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates a store holding the built-in operations catalogue.
    #[must_use]
    pub fn with_default_operations() -> Self {
        let store = Self::new();
        store.put_operations(&default_operations());
        store
    }

    /// Creates a store whose operations table is read from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Decode` if it is not a valid operations table.
    pub fn from_operations_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let operations: Operations =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Decode {
                key: OPERATIONS_KEY.to_string(),
                source,
            })?;
        info!(
            path = %path.display(),
            operations = operations.len(),
            "loaded operations table"
        );
        let store = Self::new();
        store.put_operations(&operations);
        Ok(store)
    }

    fn put_operations(&self, operations: &Operations) {
        if let Ok(value) = serde_json::to_value(operations) {
            self.entries.insert(OPERATIONS_KEY.to_string(), value);
        }
    }
}

impl ConfigHandler for ConfigStore {
    fn get_object(&self, key: &str) -> Result<serde_json::Value, ConfigError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ConfigError::NotFound {
                key: key.to_string(),
            })
    }

    fn set_object(&self, key: &str, value: serde_json::Value) -> Result<(), ConfigError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use nsm_adapter_core::{load_operations, names, OperationCategory, OperationMetadata};

    use super::*;

    #[test]
    fn default_store_serves_catalogue() {
        let store = ConfigStore::with_default_operations();
        let ops = load_operations(&store).unwrap();
        assert_eq!(ops, default_operations());
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = ConfigStore::new();
        let err = store.get_object("absent").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { key } if key == "absent"));
    }

    #[test]
    fn set_then_get_returns_value() {
        let store = ConfigStore::new();
        store.set_object("k", serde_json::json!({"a": 1})).unwrap();
        assert_eq!(store.get_object("k").unwrap()["a"], 1);
    }

    #[test]
    fn loads_operations_from_file() {
        let mut ops = Operations::new();
        ops.insert(
            names::NSM_MESH.to_string(),
            OperationMetadata::new(OperationCategory::Install, "NSM").with_versions(["v1"]),
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&ops).unwrap().as_bytes())
            .unwrap();

        let store = ConfigStore::from_operations_file(file.path()).unwrap();
        assert_eq!(load_operations(&store).unwrap(), ops);
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigStore::from_operations_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"nsm_mesh\": 42}").unwrap();
        let err = ConfigStore::from_operations_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
    }
}
