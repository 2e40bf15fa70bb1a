use std::fmt;

use serde_json::Value;

use crate::error::{KickError, Result};
use crate::models::User;
use crate::payload::{Cached, Payload};
use crate::resolver::ResolverHandle;

/// Author reference carrying only identity fields (`id`, `slug`, `username`).
///
/// Equality is by `id` alone, and an [`Author`] compares equal to a
/// `PartialAuthor` with the same id.
#[derive(Clone)]
pub struct PartialAuthor {
    payload: Payload,
    resolver: ResolverHandle,
}

impl PartialAuthor {
    /// Builds a partial view; any extra fields in the payload are ignored.
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self { payload, resolver }
    }

    pub fn id(&self) -> Result<i64> {
        self.payload.coerce_i64("id")
    }

    pub fn slug(&self) -> Result<&str> {
        self.payload.str("slug")
    }

    pub fn username(&self) -> Result<&str> {
        self.payload.str("username")
    }

    /// Fetches the full user record over the network.
    ///
    /// # Errors
    ///
    /// Returns [`KickError::NotFound`] when no such user exists and
    /// [`KickError::RequestFailed`] when the fetch itself fails.
    pub async fn to_user(&self) -> Result<User> {
        let slug = self.slug()?;
        self.resolver.fetch_user(slug).await
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for PartialAuthor {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Display for PartialAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug().unwrap_or("<unknown>"))
    }
}

impl fmt::Debug for PartialAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialAuthor")
            .field("id", &self.id().ok())
            .field("slug", &self.slug().ok())
            .finish()
    }
}

/// Message author: the partial identity plus chat styling (`color`, `badges`).
#[derive(Clone)]
pub struct Author {
    base: PartialAuthor,
    identity: Cached<Payload>,
}

impl Author {
    pub fn new(payload: Payload, resolver: ResolverHandle) -> Self {
        Self {
            base: PartialAuthor::new(payload, resolver),
            identity: Cached::new(),
        }
    }

    pub fn id(&self) -> Result<i64> {
        self.base.id()
    }

    pub fn slug(&self) -> Result<&str> {
        self.base.slug()
    }

    pub fn username(&self) -> Result<&str> {
        self.base.username()
    }

    pub async fn to_user(&self) -> Result<User> {
        self.base.to_user().await
    }

    pub fn color(&self) -> Result<&str> {
        self.identity()?.str("color")
    }

    /// Badge records exactly as sent; their shape is not pinned down upstream.
    pub fn badges(&self) -> Result<&[Value]> {
        let identity = self.identity()?;
        match identity.require("badges")? {
            Value::Array(items) => Ok(items.as_slice()),
            _ => Err(KickError::invalid(identity.path_of("badges"), "array")),
        }
    }

    pub fn as_partial(&self) -> &PartialAuthor {
        &self.base
    }

    pub fn payload(&self) -> &Payload {
        self.base.payload()
    }

    fn identity(&self) -> Result<&Payload> {
        self.identity
            .get_or_try_init(|| self.base.payload.child("identity"))
    }
}

impl AsRef<PartialAuthor> for Author {
    fn as_ref(&self) -> &PartialAuthor {
        &self.base
    }
}

impl From<Author> for PartialAuthor {
    fn from(author: Author) -> Self {
        author.base
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl PartialEq<PartialAuthor> for Author {
    fn eq(&self, other: &PartialAuthor) -> bool {
        &self.base == other
    }
}

impl PartialEq<Author> for PartialAuthor {
    fn eq(&self, other: &Author) -> bool {
        self == &other.base
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.base, f)
    }
}

impl fmt::Debug for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Author")
            .field("id", &self.id().ok())
            .field("slug", &self.slug().ok())
            .finish()
    }
}

/// Entities whose id cannot be read never compare equal.
pub(crate) fn same_id<T: PartialEq>(left: Result<T>, right: Result<T>) -> bool {
    matches!((left, right), (Ok(l), Ok(r)) if l == r)
}
