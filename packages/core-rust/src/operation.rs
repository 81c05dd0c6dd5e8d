//! Operation requests and the fixed set of operation families the adapter serves.

use serde::{Deserialize, Serialize};

/// Operation names understood by the adapter.
pub mod names {
    /// Install or remove the NSM control plane.
    pub const NSM_MESH: &str = "nsm_mesh";
    pub const BOOKINFO: &str = "bookinfo";
    pub const HTTPBIN: &str = "httpbin";
    pub const IMAGEHUB: &str = "imagehub";
    pub const EMOJIVOTO: &str = "emojivoto";
    /// Apply a user-supplied manifest.
    pub const CUSTOM: &str = "custom";
    /// Run the SMI conformance suite.
    pub const SMI_CONFORMANCE: &str = "smi_conformance";
    pub const NSM_ICMP_RESPONDER: &str = "icmp_responder_app";
    pub const NSM_VPP_ICMP_RESPONDER: &str = "vpp_icmp_responder_app";
    pub const NSM_VPN: &str = "vpn_app";

    /// Every name the dispatcher recognises.
    pub const ALL: [&str; 10] = [
        NSM_MESH,
        BOOKINFO,
        HTTPBIN,
        IMAGEHUB,
        EMOJIVOTO,
        CUSTOM,
        SMI_CONFORMANCE,
        NSM_ICMP_RESPONDER,
        NSM_VPP_ICMP_RESPONDER,
        NSM_VPN,
    ];
}

/// A request to perform one lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Key into the operations table (e.g. `"nsm_mesh"`).
    pub operation_name: String,
    /// Caller-chosen identifier echoed back on the terminal event.
    #[serde(default)]
    pub operation_id: String,
    /// Kubernetes namespace the operation targets.
    #[serde(default)]
    pub namespace: String,
    /// Remove instead of install.
    #[serde(default)]
    pub is_delete_operation: bool,
    /// Free-form manifest body for custom operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_body: Option<String>,
}

impl OperationRequest {
    /// Creates an install request for `operation_name` in `namespace`.
    #[must_use]
    pub fn new(
        operation_name: impl Into<String>,
        operation_id: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            operation_id: operation_id.into(),
            namespace: namespace.into(),
            is_delete_operation: false,
            custom_body: None,
        }
    }

    /// Marks the request as a removal.
    #[must_use]
    pub fn deleting(mut self) -> Self {
        self.is_delete_operation = true;
        self
    }

    /// Attaches a manifest body.
    #[must_use]
    pub fn with_custom_body(mut self, body: impl Into<String>) -> Self {
        self.custom_body = Some(body.into());
        self
    }
}

/// Handler family an operation name belongs to.
///
/// Each family maps to exactly one external action routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationFamily {
    /// Mesh install/remove.
    Mesh,
    /// Generic sample application deployed from manifest templates.
    SampleApp,
    /// User-supplied manifest.
    CustomManifest,
    /// NSM-specific sample application installed from a Helm chart.
    NsmSampleApp,
    /// SMI conformance run.
    SmiConformance,
}

impl OperationFamily {
    /// Resolves an operation name to its family, or `None` when unsupported.
    #[must_use]
    pub fn classify(operation_name: &str) -> Option<Self> {
        match operation_name {
            names::NSM_MESH => Some(Self::Mesh),
            names::BOOKINFO | names::HTTPBIN | names::IMAGEHUB | names::EMOJIVOTO => {
                Some(Self::SampleApp)
            }
            names::CUSTOM => Some(Self::CustomManifest),
            names::NSM_ICMP_RESPONDER | names::NSM_VPP_ICMP_RESPONDER | names::NSM_VPN => {
                Some(Self::NsmSampleApp)
            }
            names::SMI_CONFORMANCE => Some(Self::SmiConformance),
            _ => None,
        }
    }

    /// Short label used for metrics and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::SampleApp => "sample_app",
            Self::CustomManifest => "custom",
            Self::NsmSampleApp => "nsm_sample_app",
            Self::SmiConformance => "smi_conformance",
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn every_known_name_classifies() {
        for name in names::ALL {
            assert!(OperationFamily::classify(name).is_some(), "{name} unclassified");
        }
    }

    #[test]
    fn sample_apps_share_a_family() {
        for name in [names::BOOKINFO, names::HTTPBIN, names::IMAGEHUB, names::EMOJIVOTO] {
            assert_eq!(OperationFamily::classify(name), Some(OperationFamily::SampleApp));
        }
        for name in [names::NSM_ICMP_RESPONDER, names::NSM_VPP_ICMP_RESPONDER, names::NSM_VPN] {
            assert_eq!(OperationFamily::classify(name), Some(OperationFamily::NsmSampleApp));
        }
    }

    #[test]
    fn empty_name_is_unsupported() {
        assert_eq!(OperationFamily::classify(""), None);
    }

    #[test]
    fn request_defaults_when_fields_missing() {
        let req: OperationRequest =
            serde_json::from_str(r#"{"operation_name":"custom"}"#).unwrap();
        assert_eq!(req.operation_name, "custom");
        assert!(req.operation_id.is_empty());
        assert!(!req.is_delete_operation);
        assert!(req.custom_body.is_none());
    }

    #[test]
    fn builder_sets_delete_and_body() {
        let req = OperationRequest::new(names::CUSTOM, "op-1", "default")
            .deleting()
            .with_custom_body("kind: Namespace");
        assert!(req.is_delete_operation);
        assert_eq!(req.custom_body.as_deref(), Some("kind: Namespace"));
    }

    proptest! {
        #[test]
        fn classification_matches_catalogue(name in "[a-z_]{0,24}") {
            let known = names::ALL.contains(&name.as_str());
            prop_assert_eq!(OperationFamily::classify(&name).is_some(), known);
        }
    }
}
