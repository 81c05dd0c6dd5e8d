//! Server-Sent Events stream of terminal operation events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use nsm_adapter_core::Event;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use super::AppState;
use crate::shutdown::ShutdownController;

/// SSE event name carrying an operation event.
pub const SSE_EVENT_NAME: &str = "operation";

/// `GET /events`: every event published after the client connects.
///
/// The stream ends once the adapter has stopped.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = event_stream(state.events.subscribe(), Arc::clone(&state.shutdown));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn event_stream(
    rx: broadcast::Receiver<Event>,
    shutdown: Arc<ShutdownController>,
) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match SseEvent::default().event(SSE_EVENT_NAME).json_data(&event) {
                    Ok(sse) => return Some((Ok::<_, Infallible>(sse), rx)),
                    Err(err) => warn!(error = %err, "failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .take_until(async move { shutdown.stopped().await })
}
