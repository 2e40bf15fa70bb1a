//! Broadcast fan-out for dispatched notifications.

use tokio::sync::broadcast;

use super::KickEvent;

const DEFAULT_BUFFER_SIZE: usize = 256;

/// Receiver of dispatched notifications. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: KickEvent);
}

impl<F> EventSink for F
where
    F: Fn(KickEvent) + Send + Sync,
{
    fn dispatch(&self, event: KickEvent) {
        self(event)
    }
}

/// Sink backed by a tokio broadcast channel.
///
/// Dispatching with no subscribers is a no-op; slow subscribers lag rather
/// than hold up the read loop.
pub struct EventBus {
    sender: broadcast::Sender<KickEvent>,
}

impl EventBus {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KickEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl EventSink for EventBus {
    fn dispatch(&self, event: KickEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            tracing::trace!(
                target: "kick::events::bus::dispatch",
                "No subscribers for {}",
                name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn test_dispatch_delivers_to_all_receivers() {
        let bus = EventBus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        bus.dispatch(KickEvent::PinnedMessageDelete);

        assert_eq!(rx1.recv().await.unwrap().name(), "pinned_message_delete");
        assert_eq!(rx2.recv().await.unwrap().name(), "pinned_message_delete");
    }

    #[test]
    fn test_dispatch_without_receivers_is_noop() {
        let bus = EventBus::default();
        bus.dispatch(KickEvent::PinnedMessageDelete);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn test_zero_buffer_is_clamped() {
        let bus = EventBus::new(0);
        let mut rx = bus.subscribe();
        bus.dispatch(KickEvent::PinnedMessageDelete);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: KickEvent| seen.lock().unwrap().push(event.name());
        sink.dispatch(KickEvent::PinnedMessageDelete);
        assert_eq!(*seen.lock().unwrap(), vec!["pinned_message_delete"]);
    }
}
