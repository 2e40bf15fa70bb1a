use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::json;

use crate::error::{KickError, Result};
use crate::payload::Payload;
use crate::resolver::ResolverHandle;

/// A channel owner known to the resolver, either fetched or being watched.
///
/// `followers_count` is the one piece of entity state that changes after
/// construction. Updates go through atomic increments so concurrent follow and
/// unfollow notifications for the same channel never lose a change.
pub struct User {
    payload: Payload,
    id: i64,
    slug: String,
    username: String,
    followers_count: AtomicI64,
}

impl User {
    pub fn new(id: i64, slug: &str, username: &str, followers_count: i64) -> Self {
        let payload = Payload::new(json!({
            "id": id,
            "slug": slug,
            "user": { "username": username },
            "followers_count": followers_count,
        }));
        Self {
            payload,
            id,
            slug: slug.to_string(),
            username: username.to_string(),
            followers_count: AtomicI64::new(followers_count),
        }
    }

    /// Builds a user from a channel record.
    pub fn from_payload(payload: Payload) -> Result<Self> {
        let id = payload.coerce_i64("id")?;
        let slug = payload.str("slug")?.to_string();
        let username = match payload.non_empty_child("user") {
            Some(user) => user.str("username")?.to_string(),
            None => payload.str("username")?.to_string(),
        };
        let followers_count = ["followers_count", "followersCount"]
            .iter()
            .find(|key| payload.get(key).is_some_and(|v| !v.is_null()))
            .map(|key| payload.coerce_i64(key))
            .transpose()?
            .unwrap_or(0);

        Ok(Self {
            payload,
            id,
            slug,
            username,
            followers_count: AtomicI64::new(followers_count),
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn followers_count(&self) -> i64 {
        self.followers_count.load(Ordering::SeqCst)
    }

    /// Returns the count after the increment.
    pub fn record_follow(&self) -> i64 {
        self.followers_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the count after the decrement.
    pub fn record_unfollow(&self) -> i64 {
        self.followers_count.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// The record this user was built from. `followers_count` in here is the
    /// value at construction time.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("slug", &self.slug)
            .field("followers_count", &self.followers_count())
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}

/// Minimal user reference carried inside reply metadata.
#[derive(Clone)]
pub struct PartialUser {
    id: i64,
    username: String,
    resolver: ResolverHandle,
}

impl PartialUser {
    pub fn new(id: i64, username: impl Into<String>, resolver: ResolverHandle) -> Self {
        Self {
            id,
            username: username.into(),
            resolver,
        }
    }

    pub(crate) fn from_payload(payload: &Payload, resolver: ResolverHandle) -> Result<Self> {
        Ok(Self::new(
            payload.coerce_i64("id")?,
            payload.str("username")?,
            resolver,
        ))
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Fetches the full user by username. Not cached.
    pub async fn to_user(&self) -> Result<User> {
        self.resolver.fetch_user(&self.username).await
    }
}

impl PartialEq for PartialUser {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PartialUser {}

impl fmt::Debug for PartialUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish()
    }
}

impl TryFrom<serde_json::Value> for User {
    type Error = KickError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::from_payload(Payload::new(value))
    }
}
