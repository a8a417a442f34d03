//! # Event Sinks
//!
//! Shipped implementations of the notification side channel. Emission
//! is fire-and-forget: a sink with no listeners drops events rather
//! than back-pressuring the write path.

use cb_core::events::CommunityEvent;
use cb_core::traits::EventSink;
use tokio::sync::broadcast;

/// Logs every event at debug level. The default sink for deployments
/// without a live notification stream.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CommunityEvent) {
        tracing::debug!(?event, "community event");
    }
}

/// Fans events out to in-process subscribers over a tokio broadcast
/// channel (e.g., a websocket notification feed).
pub struct BroadcastSink {
    tx: broadcast::Sender<CommunityEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommunityEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: CommunityEvent) {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        let event = CommunityEvent::ItemPurchased {
            account_id: Uuid::now_v7(),
            item_id: Uuid::now_v7(),
            balance: 50,
        };
        sink.emit(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn broadcast_sink_without_subscribers_does_not_panic() {
        let sink = BroadcastSink::new(8);
        sink.emit(CommunityEvent::ReactionApplied {
            post_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            likes: 1,
            dislikes: 0,
        });
    }
}
