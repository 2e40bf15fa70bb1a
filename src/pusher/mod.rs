//! Pusher connection: the sequential read loop and topic subscriptions.

use std::sync::Arc;

use crate::config::KickConfig;
use crate::error::{KickError, Result};
use crate::events::{Dispatcher, EventKind};
use crate::models::chatroom::{channel_topic, chatroom_topic};
use crate::protocol::{ControlFrame, decode_frame};

mod transport;

pub use transport::{Transport, WebSocketTransport};

#[cfg(test)]
pub(crate) use transport::test_utils;

/// Result of one [`PusherWebSocket::poll_event`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A frame was decoded and dispatched; carries the matched kind, if any.
    Dispatched(Option<EventKind>),
    /// The transport reported closed; nothing was read.
    Closed,
}

pub struct PusherWebSocket {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
}

impl PusherWebSocket {
    pub fn new(transport: Arc<dyn Transport>, dispatcher: Dispatcher) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    /// Opens a websocket to the configured Pusher endpoint.
    pub async fn connect(config: &KickConfig, dispatcher: Dispatcher) -> Result<Self> {
        let transport = WebSocketTransport::connect(&config.pusher_url).await?;
        Ok(Self::new(Arc::new(transport), dispatcher))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Reads, decodes and dispatches a single frame.
    ///
    /// # Errors
    ///
    /// - [`KickError::Protocol`] if the frame cannot be decoded; nothing is
    ///   dispatched for it.
    /// - Classification errors from [`Dispatcher::dispatch_frame`], after the
    ///   generic notifications went out.
    /// - [`KickError::Transport`] if the transport failed.
    pub async fn poll_event(&self) -> Result<PollOutcome> {
        let Some(received) = self.transport.receive().await else {
            return Ok(PollOutcome::Closed);
        };
        let text = received?;
        tracing::debug!(
            target: "kick::pusher::poll_event",
            "WS received: {}",
            text
        );

        let frame = decode_frame(&text)?;
        let kind = self.dispatcher.dispatch_frame(frame)?;
        Ok(PollOutcome::Dispatched(kind))
    }

    /// Runs the read loop until the transport closes.
    ///
    /// Frames are handled strictly one after another, so notifications come
    /// out in wire order. Decode and classification failures are logged and
    /// the loop moves on; only a transport failure ends it early.
    pub async fn start(&self) -> Result<()> {
        tracing::debug!(target: "kick::pusher::start", "Starting read loop");

        while !self.transport.is_closed() {
            match self.poll_event().await {
                Ok(PollOutcome::Dispatched(_)) => {}
                Ok(PollOutcome::Closed) => break,
                Err(e @ KickError::Transport(_)) => {
                    tracing::error!(
                        target: "kick::pusher::start",
                        "Transport failed, stopping read loop: {}",
                        e
                    );
                    return Err(e);
                }
                Err(e @ KickError::Protocol(_)) => {
                    tracing::warn!(
                        target: "kick::pusher::start",
                        "Dropping undecodable frame: {}",
                        e
                    );
                }
                Err(e) => {
                    tracing::error!(
                        target: "kick::pusher::start",
                        "Failed to handle event: {}",
                        e
                    );
                }
            }
        }

        tracing::debug!(target: "kick::pusher::start", "Read loop finished, transport closed");
        Ok(())
    }

    pub async fn subscribe_to_chatroom(&self, chatroom_id: i64) -> Result<()> {
        self.send_control(ControlFrame::subscribe(chatroom_topic(chatroom_id)))
            .await
    }

    pub async fn unsubscribe_to_chatroom(&self, chatroom_id: i64) -> Result<()> {
        self.send_control(ControlFrame::unsubscribe(chatroom_topic(chatroom_id)))
            .await
    }

    /// Subscribes to channel-level events (livestream start, follows).
    pub async fn watch_channel(&self, channel_id: i64) -> Result<()> {
        self.send_control(ControlFrame::subscribe(channel_topic(channel_id)))
            .await
    }

    pub async fn unwatch_channel(&self, channel_id: i64) -> Result<()> {
        self.send_control(ControlFrame::unsubscribe(channel_topic(channel_id)))
            .await
    }

    async fn send_control(&self, frame: ControlFrame) -> Result<()> {
        let text = frame.to_text()?;
        tracing::debug!(
            target: "kick::pusher::send_control",
            "{} {}",
            frame.event,
            frame.data.channel
        );
        self.transport.send(text).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::test_utils::ScriptedTransport;
    use super::*;
    use crate::events::{EventSink, KickEvent};
    use crate::models::User;
    use crate::resolver::Registry;

    #[derive(Default)]
    struct RecordingSink {
        names: Mutex<Vec<&'static str>>,
    }

    impl EventSink for RecordingSink {
        fn dispatch(&self, event: KickEvent) {
            self.names.lock().unwrap().push(event.name());
        }
    }

    const CHAT_FRAME: &str = r##"{"event":"App\\Events\\ChatMessageEvent","data":"{\"id\":\"1\",\"chatroom_id\":5,\"content\":\"hi\",\"created_at\":\"2024-01-01T00:00:00\",\"sender\":{\"id\":9,\"username\":\"u\",\"slug\":\"u\",\"identity\":{\"color\":\"#fff\",\"badges\":[]}}}"}"##;

    fn setup(frames: Vec<String>) -> (Arc<ScriptedTransport>, Arc<Registry>, Arc<RecordingSink>, PusherWebSocket) {
        let transport = Arc::new(ScriptedTransport::new(frames));
        let registry = Arc::new(Registry::new());
        let sink = Arc::new(RecordingSink::default());
        let ws = PusherWebSocket::new(
            transport.clone(),
            Dispatcher::new(registry.clone(), sink.clone()),
        );
        (transport, registry, sink, ws)
    }

    fn frame(event: &str, data: serde_json::Value) -> String {
        json!({ "event": event, "data": data.to_string() }).to_string()
    }

    #[tokio::test]
    async fn test_poll_event_dispatches_one_frame() {
        let (_, _, sink, ws) = setup(vec![CHAT_FRAME.to_string()]);

        let outcome = ws.poll_event().await.unwrap();
        assert_eq!(outcome, PollOutcome::Dispatched(Some(EventKind::ChatMessage)));
        assert_eq!(
            *sink.names.lock().unwrap(),
            vec!["payload_receive", "raw_payload_receive", "message"]
        );

        assert_eq!(ws.poll_event().await.unwrap(), PollOutcome::Closed);
    }

    #[tokio::test]
    async fn test_poll_event_surfaces_protocol_error() {
        let (_, _, sink, ws) = setup(vec![r#"{"event":"x","data":"{broken"}"#.to_string()]);

        assert!(matches!(ws.poll_event().await, Err(KickError::Protocol(_))));
        assert!(sink.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_loop_survives_bad_frames() {
        let (_, registry, sink, ws) = setup(vec![
            r#"{"event":"App\\Events\\ChatMessageEvent","data":"{not json"}"#.to_string(),
            "garbage".to_string(),
            frame("App\\Events\\FollowersUpdated", json!({"channel_id": 1, "followed": true})),
            frame("App\\Events\\FollowersUpdated", json!({"channel_id": 5, "followed": true})),
            CHAT_FRAME.to_string(),
        ]);
        let watched = registry.watch_user(User::new(5, "streamer", "Streamer", 3));

        ws.start().await.unwrap();

        assert_eq!(
            *sink.names.lock().unwrap(),
            vec![
                // untracked channel 1: generic only
                "payload_receive",
                "raw_payload_receive",
                "payload_receive",
                "raw_payload_receive",
                "follow",
                "payload_receive",
                "raw_payload_receive",
                "message",
            ]
        );
        assert_eq!(watched.followers_count(), 4);
    }

    #[tokio::test]
    async fn test_events_dispatched_in_wire_order() {
        let (_, registry, sink, ws) = setup(vec![
            frame("App\\Events\\FollowersUpdated", json!({"channel_id": 5, "followed": true})),
            frame("App\\Events\\FollowersUpdated", json!({"channel_id": 5, "followed": false})),
            frame("App\\Events\\PinnedMessageDeletedEvent", json!({})),
        ]);
        let watched = registry.watch_user(User::new(5, "streamer", "Streamer", 10));

        ws.start().await.unwrap();

        let named: Vec<_> = sink
            .names
            .lock()
            .unwrap()
            .iter()
            .copied()
            .filter(|n| !n.ends_with("payload_receive"))
            .collect();
        assert_eq!(named, vec!["follow", "unfollow", "pinned_message_delete"]);
        assert_eq!(watched.followers_count(), 10);
    }

    #[tokio::test]
    async fn test_subscription_frames() {
        let (transport, _, _, ws) = setup(vec![]);

        ws.subscribe_to_chatroom(5).await.unwrap();
        ws.unsubscribe_to_chatroom(5).await.unwrap();
        ws.watch_channel(7).await.unwrap();
        ws.unwatch_channel(7).await.unwrap();

        assert_eq!(
            transport.sent(),
            vec![
                r#"{"event":"pusher:subscribe","data":{"auth":"","channel":"chatrooms.5.v2"}}"#,
                r#"{"event":"pusher:unsubscribe","data":{"auth":"","channel":"chatrooms.5.v2"}}"#,
                r#"{"event":"pusher:subscribe","data":{"auth":"","channel":"channel.7"}}"#,
                r#"{"event":"pusher:unsubscribe","data":{"auth":"","channel":"channel.7"}}"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_unwatch_channel_sends_unsubscribe() {
        let (transport, _, _, ws) = setup(vec![]);
        ws.unwatch_channel(668).await.unwrap();

        let sent: serde_json::Value = serde_json::from_str(&transport.sent()[0]).unwrap();
        assert_eq!(sent["event"], "pusher:unsubscribe");
        assert_eq!(sent["data"]["channel"], "channel.668");
    }
}
