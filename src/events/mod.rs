//! Event classification and dispatch.
//!
//! Every decoded frame produces the two generic notifications
//! (`payload_receive`, `raw_payload_receive`) and, when its tag is one of the
//! [`EventKind`]s, one named notification carrying the typed entity.

use std::sync::Arc;

use serde_json::Value;

use crate::models::{
    Message, MessageDeletedEventData, PartialLivestream, PinnedMessage, User,
    UserBannedEventData, UserUnbannedEventData,
};

mod bus;
mod dispatcher;

pub use bus::{EventBus, EventSink};
pub use dispatcher::Dispatcher;

/// Event tags this layer knows how to type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChatMessage,
    MessageDeleted,
    PinnedMessageCreated,
    PinnedMessageDeleted,
    UserBanned,
    UserUnbanned,
    StreamerIsLive,
    FollowersUpdated,
}

const EVENT_TAGS: [(&str, EventKind); 8] = [
    ("App\\Events\\ChatMessageEvent", EventKind::ChatMessage),
    ("App\\Events\\MessageDeletedEvent", EventKind::MessageDeleted),
    ("App\\Events\\PinnedMessageCreatedEvent", EventKind::PinnedMessageCreated),
    ("App\\Events\\PinnedMessageDeletedEvent", EventKind::PinnedMessageDeleted),
    ("App\\Events\\UserBannedEvent", EventKind::UserBanned),
    ("App\\Events\\UserUnbannedEvent", EventKind::UserUnbanned),
    ("App\\Events\\StreamerIsLive", EventKind::StreamerIsLive),
    ("App\\Events\\FollowersUpdated", EventKind::FollowersUpdated),
];

impl EventKind {
    /// Matches the full wire tag only. `ChatMessageEvent` without the
    /// `App\Events\` namespace is not a known tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        EVENT_TAGS
            .iter()
            .find(|(full, _)| *full == tag)
            .map(|(_, kind)| *kind)
    }

    pub fn tag(self) -> &'static str {
        EVENT_TAGS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(tag, _)| *tag)
            .unwrap_or_default()
    }
}

/// A notification emitted to consumers.
#[derive(Debug, Clone)]
pub enum KickEvent {
    /// Every frame: the event tag and its decoded inner payload, shared with
    /// the typed entity built from the same frame.
    PayloadReceive { event: String, payload: Arc<Value> },
    /// Every frame: the outer frame with `data` still string-encoded.
    RawPayloadReceive(Value),
    Message(Message),
    MessageDelete(MessageDeletedEventData),
    PinMessage(PinnedMessage),
    PinnedMessageDelete,
    UserBanned(UserBannedEventData),
    UserUnbanned(UserUnbannedEventData),
    LivestreamStart(PartialLivestream),
    /// The watched user, with `followers_count` already incremented.
    Follow(Arc<User>),
    /// The watched user, with `followers_count` already decremented.
    Unfollow(Arc<User>),
}

impl KickEvent {
    /// Notification name consumers register against.
    pub fn name(&self) -> &'static str {
        match self {
            KickEvent::PayloadReceive { .. } => "payload_receive",
            KickEvent::RawPayloadReceive(_) => "raw_payload_receive",
            KickEvent::Message(_) => "message",
            KickEvent::MessageDelete(_) => "message_delete",
            KickEvent::PinMessage(_) => "pin_message",
            KickEvent::PinnedMessageDelete => "pinned_message_delete",
            KickEvent::UserBanned(_) => "user_banned",
            KickEvent::UserUnbanned(_) => "user_unbanned",
            KickEvent::LivestreamStart(_) => "livestream_start",
            KickEvent::Follow(_) => "follow",
            KickEvent::Unfollow(_) => "unfollow",
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            KickEvent::PayloadReceive { .. } | KickEvent::RawPayloadReceive(_)
        )
    }
}
