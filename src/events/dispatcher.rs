use std::sync::Arc;

use crate::error::Result;
use crate::events::{EventKind, EventSink, KickEvent};
use crate::models::{
    Message, MessageDeletedEventData, PartialLivestream, PinnedMessage, UserBannedEventData,
    UserUnbannedEventData,
};
use crate::payload::Payload;
use crate::protocol::DecodedFrame;
use crate::resolver::ResolverHandle;

/// Turns decoded frames into notifications on an [`EventSink`].
#[derive(Clone)]
pub struct Dispatcher {
    resolver: ResolverHandle,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub fn new(resolver: ResolverHandle, sink: Arc<dyn EventSink>) -> Self {
        Self { resolver, sink }
    }

    pub fn resolver(&self) -> &ResolverHandle {
        &self.resolver
    }

    /// Emits the generic notifications for `frame`, then the named one when
    /// the tag is known. Returns the matched kind, `None` for unknown tags.
    ///
    /// # Errors
    ///
    /// Only `FollowersUpdated` can fail here: [`KickError::NotTracked`] when
    /// the channel is not watched, or a field error when `channel_id` or
    /// `followed` is missing. The generic notifications have already been
    /// emitted by then.
    ///
    /// [`KickError::NotTracked`]: crate::error::KickError::NotTracked
    pub fn dispatch_frame(&self, frame: DecodedFrame) -> Result<Option<EventKind>> {
        let DecodedFrame {
            raw,
            event,
            payload,
            ..
        } = frame;

        let payload = Arc::new(payload);
        self.sink.dispatch(KickEvent::PayloadReceive {
            event: event.clone(),
            payload: Arc::clone(&payload),
        });
        self.sink.dispatch(KickEvent::RawPayloadReceive(raw));

        let Some(kind) = EventKind::from_tag(&event) else {
            tracing::debug!(
                target: "kick::events::dispatcher::dispatch_frame",
                "No handler for event {}",
                event
            );
            return Ok(None);
        };

        let notification = self.classify(kind, Payload::from_shared(payload))?;
        tracing::debug!(
            target: "kick::events::dispatcher::dispatch_frame",
            "Dispatching {} for {}",
            notification.name(),
            event
        );
        self.sink.dispatch(notification);

        Ok(Some(kind))
    }

    /// Builds the named notification for a known event kind.
    pub fn classify(&self, kind: EventKind, payload: Payload) -> Result<KickEvent> {
        let resolver = self.resolver.clone();
        let event = match kind {
            EventKind::ChatMessage => KickEvent::Message(Message::new(payload, resolver)),
            EventKind::MessageDeleted => {
                KickEvent::MessageDelete(MessageDeletedEventData::new(payload))
            }
            EventKind::PinnedMessageCreated => {
                KickEvent::PinMessage(PinnedMessage::new(payload, resolver))
            }
            EventKind::PinnedMessageDeleted => KickEvent::PinnedMessageDelete,
            EventKind::UserBanned => {
                KickEvent::UserBanned(UserBannedEventData::new(payload, resolver))
            }
            EventKind::UserUnbanned => {
                KickEvent::UserUnbanned(UserUnbannedEventData::new(payload, resolver))
            }
            EventKind::StreamerIsLive => {
                KickEvent::LivestreamStart(PartialLivestream::new(payload))
            }
            EventKind::FollowersUpdated => self.apply_followers_update(&payload)?,
        };
        Ok(event)
    }

    fn apply_followers_update(&self, payload: &Payload) -> Result<KickEvent> {
        let channel_id = payload.coerce_i64("channel_id")?;
        let followed = payload.require("followed")?.as_bool() == Some(true);
        let user = self.resolver.lookup_tracked_user(channel_id)?;

        if followed {
            let count = user.record_follow();
            tracing::debug!(
                target: "kick::events::dispatcher::apply_followers_update",
                "Channel {} gained a follower ({})",
                channel_id,
                count
            );
            Ok(KickEvent::Follow(user))
        } else {
            let count = user.record_unfollow();
            tracing::debug!(
                target: "kick::events::dispatcher::apply_followers_update",
                "Channel {} lost a follower ({})",
                channel_id,
                count
            );
            Ok(KickEvent::Unfollow(user))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::KickError;
    use crate::models::User;
    use crate::protocol::decode_frame;
    use crate::resolver::Registry;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<KickEvent>>,
    }

    impl RecordingSink {
        fn names(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().iter().map(|e| e.name()).collect()
        }

        fn last(&self) -> KickEvent {
            self.events.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl EventSink for RecordingSink {
        fn dispatch(&self, event: KickEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn setup() -> (Arc<Registry>, Arc<RecordingSink>, Dispatcher) {
        let registry = Arc::new(Registry::new());
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(registry.clone(), sink.clone());
        (registry, sink, dispatcher)
    }

    fn frame(event: &str, data: serde_json::Value) -> DecodedFrame {
        let text = json!({ "event": event, "data": data.to_string() }).to_string();
        decode_frame(&text).unwrap()
    }

    #[test]
    fn test_chat_message_frame() {
        let (_, sink, dispatcher) = setup();
        let text = r##"{"event":"App\\Events\\ChatMessageEvent","data":"{\"id\":\"1\",\"chatroom_id\":5,\"content\":\"hi\",\"created_at\":\"2024-01-01T00:00:00\",\"sender\":{\"id\":9,\"username\":\"u\",\"slug\":\"u\",\"identity\":{\"color\":\"#fff\",\"badges\":[]}}}"}"##;

        let kind = dispatcher.dispatch_frame(decode_frame(text).unwrap()).unwrap();

        assert_eq!(kind, Some(EventKind::ChatMessage));
        assert_eq!(
            sink.names(),
            vec!["payload_receive", "raw_payload_receive", "message"]
        );
        match sink.last() {
            KickEvent::Message(message) => {
                assert_eq!(message.id().unwrap(), "1");
                assert_eq!(message.author().unwrap().username().unwrap(), "u");
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_notifications_carry_frame() {
        let (_, sink, dispatcher) = setup();
        dispatcher
            .dispatch_frame(frame("App\\Events\\PinnedMessageDeletedEvent", json!({})))
            .unwrap();

        let events = sink.events.lock().unwrap();
        match &events[0] {
            KickEvent::PayloadReceive { event, payload } => {
                assert_eq!(event, "App\\Events\\PinnedMessageDeletedEvent");
                assert_eq!(payload.as_ref(), &json!({}));
            }
            other => panic!("expected payload_receive, got {:?}", other),
        }
        match &events[1] {
            KickEvent::RawPayloadReceive(raw) => assert_eq!(raw["data"], "{}"),
            other => panic!("expected raw_payload_receive, got {:?}", other),
        }
        assert!(matches!(events[2], KickEvent::PinnedMessageDelete));
    }

    #[test]
    fn test_unknown_tag_only_generic() {
        let (_, sink, dispatcher) = setup();
        let kind = dispatcher
            .dispatch_frame(frame("App\\Events\\SomethingNew", json!({"x": 1})))
            .unwrap();

        assert_eq!(kind, None);
        assert_eq!(sink.names(), vec!["payload_receive", "raw_payload_receive"]);
    }

    #[test]
    fn test_tag_without_namespace_only_generic() {
        let (_, sink, dispatcher) = setup();
        let kind = dispatcher
            .dispatch_frame(frame("ChatMessageEvent", json!({"id": "1"})))
            .unwrap();

        assert_eq!(kind, None);
        assert_eq!(sink.names(), vec!["payload_receive", "raw_payload_receive"]);
    }

    #[test]
    fn test_generic_and_typed_views_share_payload() {
        let (_, sink, dispatcher) = setup();
        dispatcher
            .dispatch_frame(frame(
                "App\\Events\\ChatMessageEvent",
                json!({"id": "1", "chatroom_id": 5, "content": "hi"}),
            ))
            .unwrap();

        let events = sink.events.lock().unwrap();
        let shared = match &events[0] {
            KickEvent::PayloadReceive { payload, .. } => Arc::clone(payload),
            other => panic!("expected payload_receive, got {:?}", other),
        };
        match &events[2] {
            KickEvent::Message(message) => {
                assert!(Arc::ptr_eq(message.payload().root(), &shared));
                assert_eq!(message.content().unwrap(), "hi");
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_each_known_tag_dispatches_its_name() {
        let cases = [
            ("App\\Events\\MessageDeletedEvent", "message_delete"),
            ("App\\Events\\PinnedMessageCreatedEvent", "pin_message"),
            ("App\\Events\\PinnedMessageDeletedEvent", "pinned_message_delete"),
            ("App\\Events\\UserBannedEvent", "user_banned"),
            ("App\\Events\\UserUnbannedEvent", "user_unbanned"),
            ("App\\Events\\StreamerIsLive", "livestream_start"),
        ];

        for (tag, name) in cases {
            let (_, sink, dispatcher) = setup();
            dispatcher.dispatch_frame(frame(tag, json!({}))).unwrap();
            assert_eq!(sink.names().last().copied(), Some(name), "tag {}", tag);
        }
    }

    #[test]
    fn test_follow_increments_tracked_user() {
        let (registry, sink, dispatcher) = setup();
        let watched = registry.watch_user(User::new(5, "streamer", "Streamer", 3));

        dispatcher
            .dispatch_frame(frame(
                "App\\Events\\FollowersUpdated",
                json!({"channel_id": 5, "followed": true}),
            ))
            .unwrap();

        match sink.last() {
            KickEvent::Follow(user) => {
                assert!(Arc::ptr_eq(&user, &watched));
                assert_eq!(user.followers_count(), 4);
            }
            other => panic!("expected follow, got {:?}", other),
        }
    }

    #[test]
    fn test_unfollow_decrements_tracked_user() {
        let (registry, sink, dispatcher) = setup();
        registry.watch_user(User::new(5, "streamer", "Streamer", 4));

        dispatcher
            .dispatch_frame(frame(
                "App\\Events\\FollowersUpdated",
                json!({"channel_id": 5, "followed": false}),
            ))
            .unwrap();

        match sink.last() {
            KickEvent::Unfollow(user) => assert_eq!(user.followers_count(), 3),
            other => panic!("expected unfollow, got {:?}", other),
        }
    }

    #[test]
    fn test_follow_for_untracked_channel_is_reported() {
        let (_, sink, dispatcher) = setup();

        let result = dispatcher.dispatch_frame(frame(
            "App\\Events\\FollowersUpdated",
            json!({"channel_id": 99, "followed": true}),
        ));

        assert!(matches!(result, Err(KickError::NotTracked { channel_id: 99 })));
        assert_eq!(sink.names(), vec!["payload_receive", "raw_payload_receive"]);
    }

    #[test]
    fn test_follow_without_flag_is_missing_field() {
        let (registry, _, dispatcher) = setup();
        let watched = registry.watch_user(User::new(5, "streamer", "Streamer", 3));

        let result = dispatcher.dispatch_frame(frame(
            "App\\Events\\FollowersUpdated",
            json!({"channel_id": 5}),
        ));

        assert!(matches!(result, Err(KickError::MissingField { ref path }) if path == "followed"));
        assert_eq!(watched.followers_count(), 3);
    }

    #[test]
    fn test_pinned_message_delete_has_no_payload() {
        let (_, sink, dispatcher) = setup();
        dispatcher
            .dispatch_frame(frame(
                "App\\Events\\PinnedMessageDeletedEvent",
                json!({"message": {"id": "ignored"}}),
            ))
            .unwrap();
        assert!(matches!(sink.last(), KickEvent::PinnedMessageDelete));
    }
}
