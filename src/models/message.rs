use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::author::same_id;
use crate::models::{Author, Chatroom, PartialUser};
use crate::payload::{Cached, Payload};
use crate::resolver::ResolverHandle;

/// The message a reply points at, built from a reply's `metadata` object.
#[derive(Clone)]
pub struct PartialMessage {
    payload: Payload,
    resolver: ResolverHandle,
    original_message: Cached<Payload>,
    author: Cached<PartialUser>,
}

impl PartialMessage {
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self {
            payload,
            resolver,
            original_message: Cached::new(),
            author: Cached::new(),
        }
    }

    pub fn id(&self) -> Result<&str> {
        self.original_message()?.str("id")
    }

    pub fn content(&self) -> Result<&str> {
        self.original_message()?.str("content")
    }

    /// Sender of the original message. The id may arrive as a string and is
    /// coerced to an integer.
    pub fn author(&self) -> Result<&PartialUser> {
        self.author.get_or_try_init(|| {
            let sender = self.payload.child("original_sender")?;
            PartialUser::from_payload(&sender, self.resolver.clone())
        })
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    fn original_message(&self) -> Result<&Payload> {
        self.original_message
            .get_or_try_init(|| self.payload.child("original_message"))
    }
}

impl PartialEq for PartialMessage {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Debug for PartialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialMessage")
            .field("id", &self.id().ok())
            .field("author", &self.author().ok())
            .finish()
    }
}

/// A chat message as delivered by `ChatMessageEvent`.
#[derive(Clone)]
pub struct Message {
    payload: Payload,
    resolver: ResolverHandle,
    is_reply: Cached<bool>,
    references: Cached<Option<PartialMessage>>,
    created_at: Cached<DateTime<Utc>>,
    author: Cached<Author>,
    chatroom: Cached<Option<Chatroom>>,
}

impl Message {
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self {
            payload,
            resolver,
            is_reply: Cached::new(),
            references: Cached::new(),
            created_at: Cached::new(),
            author: Cached::new(),
            chatroom: Cached::new(),
        }
    }

    pub fn id(&self) -> Result<&str> {
        self.payload.str("id")
    }

    pub fn chatroom_id(&self) -> Result<i64> {
        self.payload.coerce_i64("chatroom_id")
    }

    pub fn content(&self) -> Result<&str> {
        self.payload.str("content")
    }

    /// Upstream message type (`"message"` or `"reply"`), when sent.
    pub fn message_type(&self) -> Option<&str> {
        self.payload.get("type").and_then(|v| v.as_str())
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        self.created_at
            .get_or_try_init(|| self.payload.datetime("created_at"))
            .copied()
    }

    pub fn author(&self) -> Result<&Author> {
        self.author.get_or_try_init(|| {
            Ok(Author::new(
                self.payload.child("sender")?,
                self.resolver.clone(),
            ))
        })
    }

    /// True when the message carries a non-empty `metadata` object.
    pub fn is_reply(&self) -> bool {
        *self
            .is_reply
            .get_or_init(|| self.payload.non_empty_child("metadata").is_some())
    }

    /// The message being replied to, `None` unless [`Message::is_reply`].
    pub fn references(&self) -> Option<&PartialMessage> {
        self.references
            .get_or_init(|| {
                self.payload
                    .non_empty_child("metadata")
                    .map(|metadata| PartialMessage::new(metadata, self.resolver.clone()))
            })
            .as_ref()
    }

    /// Chatroom the message was sent in, if the resolver knows it. The lookup
    /// happens once; later calls return the same answer.
    pub fn chatroom(&self) -> Result<Option<&Chatroom>> {
        let chatroom = self.chatroom.get_or_try_init(|| -> Result<Option<Chatroom>> {
            let chatroom_id = self.chatroom_id()?;
            Ok(self.resolver.lookup_chatroom(chatroom_id))
        })?;
        Ok(chatroom.as_ref())
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id().ok())
            .field("chatroom_id", &self.chatroom_id().ok())
            .field("author", &self.author().ok())
            .finish()
    }
}

/// `PinnedMessageCreatedEvent` data.
#[derive(Clone)]
pub struct PinnedMessage {
    payload: Payload,
    resolver: ResolverHandle,
    message: Cached<Message>,
    duration: Cached<i64>,
    pinned_by: Cached<Author>,
}

impl PinnedMessage {
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self {
            payload,
            resolver,
            message: Cached::new(),
            duration: Cached::new(),
            pinned_by: Cached::new(),
        }
    }

    pub fn message(&self) -> Result<&Message> {
        self.message.get_or_try_init(|| {
            Ok(Message::new(
                self.payload.child("message")?,
                self.resolver.clone(),
            ))
        })
    }

    /// Pin duration in seconds.
    pub fn duration(&self) -> Result<i64> {
        self.duration
            .get_or_try_init(|| self.payload.coerce_i64("duration"))
            .copied()
    }

    pub fn pinned_by(&self) -> Result<&Author> {
        self.pinned_by.get_or_try_init(|| {
            Ok(Author::new(
                self.payload.child("pinnedBy")?,
                self.resolver.clone(),
            ))
        })
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Debug for PinnedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedMessage")
            .field("message", &self.message().ok())
            .field("duration", &self.duration().ok())
            .field("pinned_by", &self.pinned_by().ok())
            .finish()
    }
}
