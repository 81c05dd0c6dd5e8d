//! Test doubles shared by the unit tests of this crate.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nsm_adapter_core::catalog::OPERATIONS_KEY;
use nsm_adapter_core::{
    ActionFailure, ActionResult, AdapterError, ConfigError, ConfigHandler, Event, EventSink,
    EventType, MeshActions, Operations, SmiTestOptions, Status,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// An event as seen by the sink, with the rendered error for failures.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub event: Event,
    pub error: Option<String>,
}

/// Sink that forwards every reported event to a channel.
#[derive(Clone)]
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Recorded>,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Recorded>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn stream_info(&self, mut event: Event) {
        event.event_type = EventType::Info;
        let _ = self.tx.send(Recorded { event, error: None });
    }

    async fn stream_err(&self, mut event: Event, err: &(dyn StdError + Send + Sync + 'static)) {
        event.event_type = EventType::Error;
        let _ = self.tx.send(Recorded {
            event,
            error: Some(err.to_string()),
        });
    }
}

/// Waits for the next recorded event, failing the test after two seconds.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Recorded {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("sink channel closed")
}

/// Asserts that no further event arrives within a short grace period.
pub async fn assert_no_more_events(rx: &mut mpsc::UnboundedReceiver<Recorded>) {
    if let Ok(Some(extra)) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
        panic!("unexpected extra event: {extra:?}");
    }
}

// ---------------------------------------------------------------------------
// ScriptedActions
// ---------------------------------------------------------------------------

/// One recorded call into [`ScriptedActions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCall {
    Mesh {
        delete: bool,
        version: String,
        namespace: String,
    },
    SampleApp {
        namespace: String,
        delete: bool,
        templates: Vec<String>,
    },
    Custom {
        namespace: String,
        manifest: String,
        delete: bool,
    },
    NsmSampleApp {
        namespace: String,
        chart: String,
        version: String,
        delete: bool,
    },
    Smi(SmiTestOptions),
}

#[derive(Debug, Clone)]
enum Script {
    Succeed,
    Fail { status: Status, error: AdapterError },
    FailUnstructured { status: Status, message: String },
    Panic,
}

/// Action routines that succeed or fail as scripted and record every call.
pub struct ScriptedActions {
    script: Script,
    delay: Option<Duration>,
    calls: Mutex<Vec<ActionCall>>,
}

impl ScriptedActions {
    pub fn succeeding() -> Self {
        Self {
            script: Script::Succeed,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every routine fails with `error`, reporting `status` as reached.
    pub fn failing(status: Status, error: AdapterError) -> Self {
        Self {
            script: Script::Fail { status, error },
            ..Self::succeeding()
        }
    }

    /// Every routine fails with a plain error message.
    pub fn failing_unstructured(status: Status, message: &str) -> Self {
        Self {
            script: Script::FailUnstructured {
                status,
                message: message.to_string(),
            },
            ..Self::succeeding()
        }
    }

    /// Every routine panics mid-call.
    pub fn panicking() -> Self {
        Self {
            script: Script::Panic,
            ..Self::succeeding()
        }
    }

    /// Sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ActionCall> {
        self.calls.lock().clone()
    }

    async fn answer(&self, call: ActionCall, success: Status) -> ActionResult {
        self.calls.lock().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.script {
            Script::Succeed => Ok(success),
            Script::Fail { status, error } => Err(ActionFailure::new(*status, error.clone())),
            Script::FailUnstructured { status, message } => {
                Err(ActionFailure::new(*status, anyhow::anyhow!(message.clone())))
            }
            Script::Panic => panic!("scripted action panicked"),
        }
    }
}

#[async_trait]
impl MeshActions for ScriptedActions {
    async fn install_nsm_mesh(&self, delete: bool, version: &str, namespace: &str) -> ActionResult {
        let call = ActionCall::Mesh {
            delete,
            version: version.to_string(),
            namespace: namespace.to_string(),
        };
        self.answer(call, Status::installed(delete)).await
    }

    async fn install_sample_app(
        &self,
        namespace: &str,
        delete: bool,
        templates: &[String],
    ) -> ActionResult {
        let call = ActionCall::SampleApp {
            namespace: namespace.to_string(),
            delete,
            templates: templates.to_vec(),
        };
        self.answer(call, Status::deployed(delete)).await
    }

    async fn apply_custom_operation(
        &self,
        namespace: &str,
        manifest: &str,
        delete: bool,
    ) -> ActionResult {
        let call = ActionCall::Custom {
            namespace: namespace.to_string(),
            manifest: manifest.to_string(),
            delete,
        };
        self.answer(call, Status::deployed(delete)).await
    }

    async fn install_nsm_sample_app(
        &self,
        namespace: &str,
        chart: &str,
        version: &str,
        delete: bool,
    ) -> ActionResult {
        let call = ActionCall::NsmSampleApp {
            namespace: namespace.to_string(),
            chart: chart.to_string(),
            version: version.to_string(),
            delete,
        };
        self.answer(call, Status::installed(delete)).await
    }

    async fn run_smi_test(&self, options: SmiTestOptions) -> anyhow::Result<String> {
        self.answer(ActionCall::Smi(options), Status::Completed)
            .await
            .map(|_| "conformance report".to_string())
            .map_err(|failure| failure.error)
    }
}

// ---------------------------------------------------------------------------
// Config doubles
// ---------------------------------------------------------------------------

/// Config accessor whose reads always fail.
pub struct FailingConfig;

impl ConfigHandler for FailingConfig {
    fn get_object(&self, key: &str) -> Result<serde_json::Value, ConfigError> {
        Err(ConfigError::NotFound {
            key: key.to_string(),
        })
    }

    fn set_object(&self, _key: &str, _value: serde_json::Value) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Config store seeded with `operations`.
pub fn config_with(operations: &Operations) -> Arc<crate::store::ConfigStore> {
    let store = crate::store::ConfigStore::new();
    store
        .set_object(
            OPERATIONS_KEY,
            serde_json::to_value(operations).expect("operations serialize"),
        )
        .expect("in-memory store accepts writes");
    Arc::new(store)
}
