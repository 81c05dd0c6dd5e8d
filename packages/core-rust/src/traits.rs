use std::collections::BTreeMap;
use std::error::Error as StdError;

use async_trait::async_trait;

use crate::event::Event;
use crate::status::Status;

/// Reporting sink for terminal operation events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Reports a successful outcome.
    async fn stream_info(&self, event: Event);

    /// Reports a failed outcome together with the error behind it.
    async fn stream_err(&self, event: Event, err: &(dyn StdError + Send + Sync + 'static));
}

/// A failed action routine: the status word it had reached plus the cause.
#[derive(Debug)]
pub struct ActionFailure {
    pub status: Status,
    pub error: anyhow::Error,
}

impl ActionFailure {
    #[must_use]
    pub fn new(status: Status, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }
}

/// Outcome of an install/apply routine.
pub type ActionResult = Result<Status, ActionFailure>;

/// Inputs to an SMI conformance run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmiTestOptions {
    pub operation_id: String,
    /// URL of the conformance tool manifest.
    pub manifest: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

/// External routines that actually change the cluster.
///
/// Each call performs exactly one action; the dispatcher never retries.
#[async_trait]
pub trait MeshActions: Send + Sync {
    /// Installs or removes the NSM control plane at `version`.
    async fn install_nsm_mesh(&self, delete: bool, version: &str, namespace: &str) -> ActionResult;

    /// Applies or deletes the manifest templates of a sample application.
    async fn install_sample_app(
        &self,
        namespace: &str,
        delete: bool,
        templates: &[String],
    ) -> ActionResult;

    /// Applies or deletes a user-supplied manifest.
    async fn apply_custom_operation(
        &self,
        namespace: &str,
        manifest: &str,
        delete: bool,
    ) -> ActionResult;

    /// Installs or removes an NSM sample application from its Helm chart.
    async fn install_nsm_sample_app(
        &self,
        namespace: &str,
        chart: &str,
        version: &str,
        delete: bool,
    ) -> ActionResult;

    /// Runs the SMI conformance suite and returns its report.
    async fn run_smi_test(&self, options: SmiTestOptions) -> anyhow::Result<String>;
}
