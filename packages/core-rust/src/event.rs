use serde::{Deserialize, Serialize};

use crate::status::Status;

/// Details text of the placeholder event built before a handler runs.
pub const UNSUPPORTED_DETAILS: &str = "Operation is not supported";

/// Severity stamped on an event by the sink that reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    Info,
    Error,
}

/// Identity of the component emitting events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component kind (e.g. `"adapter"`).
    pub kind: String,
    /// Component name (e.g. `"nsm-adapter"`).
    pub name: String,
}

/// Terminal status report for one dispatched operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub operation_id: String,
    #[serde(default)]
    pub event_type: EventType,
    pub summary: String,
    pub details: String,
    pub component: String,
    pub component_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probable_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_remediation: Option<String>,
}

impl Event {
    /// Builds the "not supported" placeholder every dispatch starts from.
    #[must_use]
    pub fn placeholder(operation_id: impl Into<String>, component: &Component) -> Self {
        Self {
            operation_id: operation_id.into(),
            event_type: EventType::Info,
            summary: Status::Deploying.to_string(),
            details: UNSUPPORTED_DETAILS.to_string(),
            component: component.kind.clone(),
            component_name: component.name.clone(),
            error_code: None,
            probable_cause: None,
            suggested_remediation: None,
        }
    }
}
