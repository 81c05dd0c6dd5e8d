//! Terminal event reporting shared by the dispatcher and the worker pool.

use std::error::Error as StdError;

use nsm_adapter_core::errors::{error_code, probable_cause, suggested_remediation};
use nsm_adapter_core::{Event, EventSink};

use super::operation::{Completion, HandlerFailure};

/// Fills `event` with an error narrative and reports it on `sink`.
pub async fn stream_error(
    sink: &dyn EventSink,
    mut event: Event,
    summary: impl Into<String>,
    err: &(dyn StdError + Send + Sync + 'static),
) {
    event.summary = summary.into();
    event.details = err.to_string();
    event.error_code = Some(error_code(err));
    event.probable_cause = Some(probable_cause(err));
    event.suggested_remediation = Some(suggested_remediation(err));
    sink.stream_err(event, err).await;
}

/// Reports the outcome of a handler as the operation's single terminal event.
pub async fn report_outcome(
    sink: &dyn EventSink,
    mut event: Event,
    outcome: Result<Completion, HandlerFailure>,
) {
    match outcome {
        Ok(Completion { summary, details }) => {
            event.summary = summary;
            event.details = details;
            sink.stream_info(event).await;
        }
        Err(HandlerFailure { summary, error }) => {
            stream_error(sink, event, summary, &*error).await;
        }
    }
}
