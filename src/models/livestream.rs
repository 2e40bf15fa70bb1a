use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::author::same_id;
use crate::payload::{Cached, Payload};

/// Livestream announced by `StreamerIsLive`.
#[derive(Clone)]
pub struct PartialLivestream {
    payload: Payload,
    created_at: Cached<DateTime<Utc>>,
}

impl PartialLivestream {
    /// Accepts either the event payload (fields under `livestream`) or the
    /// livestream object itself.
    pub fn new(payload: Payload) -> Self {
        let payload = payload.non_empty_child("livestream").unwrap_or(payload);
        Self {
            payload,
            created_at: Cached::new(),
        }
    }

    pub fn id(&self) -> Result<i64> {
        self.payload.coerce_i64("id")
    }

    pub fn channel_id(&self) -> Result<i64> {
        self.payload.coerce_i64("channel_id")
    }

    pub fn title(&self) -> Result<&str> {
        self.payload.str("session_title")
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        self.created_at
            .get_or_try_init(|| self.payload.datetime("created_at"))
            .copied()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl PartialEq for PartialLivestream {
    fn eq(&self, other: &Self) -> bool {
        same_id(self.id(), other.id())
    }
}

impl fmt::Debug for PartialLivestream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialLivestream")
            .field("id", &self.id().ok())
            .field("title", &self.title().ok())
            .finish()
    }
}
