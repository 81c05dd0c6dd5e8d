//! Event sink fanning terminal events out to every subscriber.

use std::error::Error as StdError;

use async_trait::async_trait;
use nsm_adapter_core::{Event, EventSink, EventType};
use tokio::sync::broadcast;
use tracing::{error, info};

/// Default number of events buffered per subscriber before it starts lagging.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// [`EventSink`] publishing on a `tokio::sync::broadcast` channel.
///
/// Slow subscribers miss events instead of blocking reporters; the receiver
/// observes `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<Event>,
}

impl BroadcastEventSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns a receiver for every event published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine: the event has already been logged.
        let _ = self.tx.send(event);
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn stream_info(&self, mut event: Event) {
        event.event_type = EventType::Info;
        info!(
            operation_id = %event.operation_id,
            summary = %event.summary,
            "operation event"
        );
        self.publish(event);
    }

    async fn stream_err(&self, mut event: Event, err: &(dyn StdError + Send + Sync + 'static)) {
        event.event_type = EventType::Error;
        error!(
            operation_id = %event.operation_id,
            summary = %event.summary,
            code = event.error_code.as_deref().unwrap_or_default(),
            error = %err,
            "operation failed"
        );
        self.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use nsm_adapter_core::{AdapterError, Component};

    use super::*;

    fn event() -> Event {
        Event::placeholder(
            "op-1",
            &Component {
                kind: "adapter".to_string(),
                name: "nsm-adapter".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn subscribers_receive_info_events() {
        let sink = BroadcastEventSink::default();
        let mut rx = sink.subscribe();

        sink.stream_info(event()).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.operation_id, "op-1");
        assert_eq!(received.event_type, EventType::Info);
    }

    #[tokio::test]
    async fn error_events_are_stamped() {
        let sink = BroadcastEventSink::default();
        let mut rx = sink.subscribe();

        sink.stream_err(event(), &AdapterError::op_invalid()).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, EventType::Error);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        let sink = BroadcastEventSink::new(4);
        assert_eq!(sink.subscriber_count(), 0);
        sink.stream_info(event()).await;
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let sink = BroadcastEventSink::new(4);
        let mut a = sink.subscribe();
        let mut b = sink.subscribe();
        assert_eq!(sink.subscriber_count(), 2);

        sink.stream_info(event()).await;

        assert_eq!(a.recv().await.unwrap().operation_id, "op-1");
        assert_eq!(b.recv().await.unwrap().operation_id, "op-1");
    }
}
