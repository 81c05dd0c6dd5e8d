use nsm_adapter_core::Component;

/// Default manifest of the SMI conformance tool.
pub const DEFAULT_SMI_MANIFEST: &str =
    "https://raw.githubusercontent.com/layer5io/learn-layer5/master/smi-conformance/manifest.yml";

/// Namespace the SMI conformance tool runs in.
pub const DEFAULT_SMI_NAMESPACE: &str = "meshery";

/// Adapter-level configuration for the operation dispatch framework.
///
/// Loaded once at startup and handed to the dispatcher; nothing here changes
/// while operations run.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Component name stamped on every event.
    pub name: String,
    /// Component kind stamped on every event.
    pub component_type: String,
    /// Conformance tool manifest used by `smi_conformance`.
    pub smi_manifest: String,
    /// Namespace the conformance tool is deployed to.
    pub smi_namespace: String,
    /// Maximum number of operations executing at once.
    pub max_concurrent_operations: u32,
    /// Operations accepted but not yet running before new ones are rejected.
    pub queue_capacity: usize,
    /// Per-operation deadline in milliseconds. `None` lets operations run
    /// until the external routine returns.
    pub operation_timeout_ms: Option<u64>,
}

impl AdapterConfig {
    /// Identity stamped on emitted events.
    #[must_use]
    pub fn component(&self) -> Component {
        Component {
            kind: self.component_type.clone(),
            name: self.name.clone(),
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: "nsm-adapter".to_string(),
            component_type: "adapter".to_string(),
            smi_manifest: DEFAULT_SMI_MANIFEST.to_string(),
            smi_namespace: DEFAULT_SMI_NAMESPACE.to_string(),
            max_concurrent_operations: 16,
            queue_capacity: 256,
            operation_timeout_ms: None,
        }
    }
}
