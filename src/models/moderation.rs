//! Moderation event payloads: message deletion, bans and unbans.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{KickError, Result};
use crate::models::PartialAuthor;
use crate::models::author::same_id;
use crate::payload::{Cached, Payload};
use crate::resolver::ResolverHandle;

#[derive(Clone)]
pub struct MessageDeletedEventData {
    payload: Payload,
    message: Cached<Payload>,
    ai_moderated: Cached<bool>,
}

impl MessageDeletedEventData {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            message: Cached::new(),
            ai_moderated: Cached::new(),
        }
    }

    /// Id of the deletion event itself.
    pub fn id(&self) -> Result<&str> {
        self.payload.str("id")
    }

    /// Id of the deleted message.
    pub fn message_id(&self) -> Result<&str> {
        self.message
            .get_or_try_init(|| self.payload.child("message"))?
            .str("id")
    }

    pub fn ai_moderated(&self) -> bool {
        *self
            .ai_moderated
            .get_or_init(|| self.payload.truthy("aiModerated"))
    }

    /// Rules the message broke, as raw records. `None` when not reported.
    pub fn violated_rules(&self) -> Result<Option<&[Value]>> {
        match self.payload.get("violatedRules") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(rules)) => Ok(Some(rules.as_slice())),
            Some(_) => Err(KickError::invalid(
                self.payload.path_of("violatedRules"),
                "array",
            )),
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for MessageDeletedEventData {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Debug for MessageDeletedEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDeletedEventData")
            .field("id", &self.id().ok())
            .field("message_id", &self.message_id().ok())
            .finish()
    }
}

#[derive(Clone)]
pub struct UserBannedEventData {
    payload: Payload,
    resolver: ResolverHandle,
    user: Cached<PartialAuthor>,
    banned_by: Cached<PartialAuthor>,
    is_permanent: Cached<bool>,
}

impl UserBannedEventData {
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self {
            payload,
            resolver,
            user: Cached::new(),
            banned_by: Cached::new(),
            is_permanent: Cached::new(),
        }
    }

    pub fn id(&self) -> Result<&str> {
        self.payload.str("id")
    }

    /// The banned user.
    pub fn user(&self) -> Result<&PartialAuthor> {
        self.user
            .get_or_try_init(|| partial_author(&self.payload, "user", &self.resolver))
    }

    /// The moderator who issued the ban.
    pub fn banned_by(&self) -> Result<&PartialAuthor> {
        self.banned_by
            .get_or_try_init(|| partial_author(&self.payload, "banned_by", &self.resolver))
    }

    pub fn is_permanent(&self) -> bool {
        *self
            .is_permanent
            .get_or_init(|| self.payload.truthy("permanent"))
    }

    /// End of a temporary ban; `None` for permanent bans.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        match self.payload.get("expires_at") {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.payload.datetime("expires_at").map(Some),
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for UserBannedEventData {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Debug for UserBannedEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserBannedEventData")
            .field("user", &self.user().ok())
            .field("banned_by", &self.banned_by().ok())
            .finish()
    }
}

#[derive(Clone)]
pub struct UserUnbannedEventData {
    payload: Payload,
    resolver: ResolverHandle,
    user: Cached<PartialAuthor>,
    unbanned_by: Cached<PartialAuthor>,
    is_permanent: Cached<bool>,
}

impl UserUnbannedEventData {
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self {
            payload,
            resolver,
            user: Cached::new(),
            unbanned_by: Cached::new(),
            is_permanent: Cached::new(),
        }
    }

    pub fn id(&self) -> Result<&str> {
        self.payload.str("id")
    }

    /// The unbanned user.
    pub fn user(&self) -> Result<&PartialAuthor> {
        self.user
            .get_or_try_init(|| partial_author(&self.payload, "user", &self.resolver))
    }

    pub fn unbanned_by(&self) -> Result<&PartialAuthor> {
        self.unbanned_by
            .get_or_try_init(|| partial_author(&self.payload, "unbanned_by", &self.resolver))
    }

    /// Whether the lifted ban had been permanent.
    pub fn is_permanent(&self) -> bool {
        *self
            .is_permanent
            .get_or_init(|| self.payload.truthy("permanent"))
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for UserUnbannedEventData {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Debug for UserUnbannedEventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUnbannedEventData")
            .field("user", &self.user().ok())
            .field("unbanned_by", &self.unbanned_by().ok())
            .finish()
    }
}

fn partial_author(payload: &Payload, key: &str, resolver: &ResolverHandle) -> Result<PartialAuthor> {
    Ok(PartialAuthor::new(payload.child(key)?, resolver.clone()))
}
