//! Operation metadata and the built-in catalogue of NSM adapter operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::names;

/// Config key under which the operations table is stored.
pub const OPERATIONS_KEY: &str = "operations";

/// Keys of [`OperationMetadata::additional_properties`].
pub mod properties {
    /// Display name of the application an operation deploys.
    pub const SERVICE_NAME: &str = "service_name";
    /// Helm chart of an NSM sample application.
    pub const HELM_CHART: &str = "helm_chart";
}

/// Category an operation is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationCategory {
    Install,
    SampleApplication,
    Configure,
    Validate,
    Custom,
}

/// Read-only description of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetadata {
    #[serde(rename = "type")]
    pub category: OperationCategory,
    #[serde(default)]
    pub description: String,
    /// Ordered versions; the first one is installed.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Manifest references applied for sample applications.
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub additional_properties: BTreeMap<String, String>,
}

impl OperationMetadata {
    /// Creates metadata with only a category and description.
    #[must_use]
    pub fn new(category: OperationCategory, description: impl Into<String>) -> Self {
        Self {
            category,
            description: description.into(),
            versions: Vec::new(),
            templates: Vec::new(),
            additional_properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }

    /// First listed version, if any.
    #[must_use]
    pub fn primary_version(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    /// Looks up an auxiliary property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.additional_properties.get(key).map(String::as_str)
    }
}

/// Operations table keyed by operation name.
pub type Operations = BTreeMap<String, OperationMetadata>;

/// Default NSM chart version installed by the mesh operation.
pub const DEFAULT_NSM_VERSION: &str = "v0.2.0";

/// The operations this adapter ships with.
#[must_use]
pub fn default_operations() -> Operations {
    use OperationCategory::{Custom, Install, SampleApplication, Validate};
    use properties::{HELM_CHART, SERVICE_NAME};

    let mut ops = Operations::new();
    ops.insert(
        names::NSM_MESH.to_string(),
        OperationMetadata::new(Install, "Network Service Mesh")
            .with_versions([DEFAULT_NSM_VERSION]),
    );
    ops.insert(
        names::BOOKINFO.to_string(),
        OperationMetadata::new(SampleApplication, "BookInfo Application")
            .with_templates([
                "https://raw.githubusercontent.com/istio/istio/master/samples/bookinfo/platform/kube/bookinfo.yaml",
            ])
            .with_property(SERVICE_NAME, "productpage"),
    );
    ops.insert(
        names::HTTPBIN.to_string(),
        OperationMetadata::new(SampleApplication, "HTTPbin Application")
            .with_templates([
                "https://raw.githubusercontent.com/istio/istio/master/samples/httpbin/httpbin.yaml",
            ])
            .with_property(SERVICE_NAME, "httpbin"),
    );
    ops.insert(
        names::IMAGEHUB.to_string(),
        OperationMetadata::new(SampleApplication, "Image Hub Application")
            .with_templates([
                "https://raw.githubusercontent.com/layer5io/image-hub/master/deployment.yaml",
            ])
            .with_property(SERVICE_NAME, "ingress"),
    );
    ops.insert(
        names::EMOJIVOTO.to_string(),
        OperationMetadata::new(SampleApplication, "Emojivoto Application")
            .with_templates(["https://run.linkerd.io/emojivoto.yml"])
            .with_property(SERVICE_NAME, "web-svc"),
    );
    ops.insert(
        names::NSM_ICMP_RESPONDER.to_string(),
        OperationMetadata::new(SampleApplication, "ICMP Responder Application")
            .with_property(SERVICE_NAME, "icmp-responder")
            .with_property(HELM_CHART, "icmp-responder"),
    );
    ops.insert(
        names::NSM_VPP_ICMP_RESPONDER.to_string(),
        OperationMetadata::new(SampleApplication, "VPP ICMP Responder Application")
            .with_property(SERVICE_NAME, "vpp-icmp-responder")
            .with_property(HELM_CHART, "vpp-icmp-responder"),
    );
    ops.insert(
        names::NSM_VPN.to_string(),
        OperationMetadata::new(SampleApplication, "VPN Application")
            .with_property(SERVICE_NAME, "vpn")
            .with_property(HELM_CHART, "vpn"),
    );
    ops.insert(
        names::CUSTOM.to_string(),
        OperationMetadata::new(Custom, "Custom YAML"),
    );
    ops.insert(
        names::SMI_CONFORMANCE.to_string(),
        OperationMetadata::new(Validate, "SMI Conformance"),
    );
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogue_covers_every_operation_name() {
        let ops = default_operations();
        for name in names::ALL {
            assert!(ops.contains_key(name), "missing catalogue entry for {name}");
        }
        assert_eq!(ops.len(), names::ALL.len());
    }

    #[test]
    fn mesh_entry_has_a_primary_version() {
        let ops = default_operations();
        assert_eq!(ops[names::NSM_MESH].primary_version(), Some(DEFAULT_NSM_VERSION));
    }

    #[test]
    fn nsm_sample_apps_reference_charts() {
        let ops = default_operations();
        for name in [names::NSM_ICMP_RESPONDER, names::NSM_VPP_ICMP_RESPONDER, names::NSM_VPN] {
            assert!(ops[name].property(properties::HELM_CHART).is_some());
            assert!(ops[name].property(properties::SERVICE_NAME).is_some());
        }
    }

    #[test]
    fn metadata_decodes_with_missing_optional_fields() {
        let meta: OperationMetadata =
            serde_json::from_str(r#"{"type":"validate","description":"SMI Conformance"}"#).unwrap();
        assert_eq!(meta.category, OperationCategory::Validate);
        assert!(meta.versions.is_empty());
        assert!(meta.primary_version().is_none());
    }

    #[test]
    fn table_round_trips_through_json() {
        let ops = default_operations();
        let value = serde_json::to_value(&ops).unwrap();
        let decoded: Operations = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, ops);
    }
}
