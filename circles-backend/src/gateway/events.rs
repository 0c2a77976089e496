//! Event broadcaster for sync notifications
//!
//! Fan-out over a tokio broadcast channel. Broadcasting never blocks and
//! never fails; with no subscribers events are simply dropped.

use tokio::sync::broadcast;

use super::protocol::CirclesEvent;

/// Buffered events per subscriber before lagging kicks in
const CHANNEL_CAPACITY: usize = 256;

pub struct EventBroadcaster {
    sender: broadcast::Sender<CirclesEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Emit an event to all current subscribers
    pub fn broadcast(&self, event: CirclesEvent) {
        log::debug!("[EVENT] {}: {}", event.event, event.data);
        // Err only means nobody is listening right now
        let _ = self.sender.send(event);
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<CirclesEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.broadcast(CirclesEvent::circles_updated(3));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "circles.updated");
        assert_eq!(event.data["circle_count"], 3);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        broadcaster.broadcast(CirclesEvent::token_received());
    }
}
