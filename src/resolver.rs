//! Lookup capability handed to every entity.
//!
//! Entities never reach for ambient state: cross references (message to
//! chatroom, author to user, follow updates to a watched channel) go through
//! the [`Resolver`] they were constructed with.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{KickError, Result};
use crate::models::{Chatroom, User};

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Locally known chatroom, `None` when it is not cached.
    fn lookup_chatroom(&self, chatroom_id: i64) -> Option<Chatroom>;

    /// User currently watched for follow events on `channel_id`.
    fn lookup_tracked_user(&self, channel_id: i64) -> Result<Arc<User>>;

    /// Remote fetch; never cached and never mutates local state.
    async fn fetch_user(&self, slug: &str) -> Result<User>;
}

pub type ResolverHandle = Arc<dyn Resolver>;

/// Source of remote user records for a [`Registry`].
#[async_trait]
pub trait UserFetcher: Send + Sync {
    async fn fetch_user(&self, slug: &str) -> Result<User>;
}

/// In-memory resolver holding known chatrooms and watched users.
#[derive(Default)]
pub struct Registry {
    chatrooms: DashMap<i64, Chatroom>,
    watched_users: DashMap<i64, Arc<User>>,
    fetcher: Option<Arc<dyn UserFetcher>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetcher(fetcher: Arc<dyn UserFetcher>) -> Self {
        Self {
            fetcher: Some(fetcher),
            ..Self::default()
        }
    }

    pub fn add_chatroom(&self, chatroom: Chatroom) {
        self.chatrooms.insert(chatroom.id, chatroom);
    }

    pub fn remove_chatroom(&self, chatroom_id: i64) -> Option<Chatroom> {
        self.chatrooms.remove(&chatroom_id).map(|(_, chatroom)| chatroom)
    }

    /// Starts tracking `user` for follow events; returns the shared handle.
    pub fn watch_user(&self, user: User) -> Arc<User> {
        let user = Arc::new(user);
        self.watched_users.insert(user.id(), Arc::clone(&user));
        tracing::debug!(
            target: "kick::resolver::watch_user",
            "Watching channel {} ({})",
            user.id(),
            user.slug()
        );
        user
    }

    pub fn unwatch_user(&self, channel_id: i64) -> Option<Arc<User>> {
        self.watched_users.remove(&channel_id).map(|(_, user)| user)
    }

    pub fn is_watching(&self, channel_id: i64) -> bool {
        self.watched_users.contains_key(&channel_id)
    }
}

#[async_trait]
impl Resolver for Registry {
    fn lookup_chatroom(&self, chatroom_id: i64) -> Option<Chatroom> {
        self.chatrooms.get(&chatroom_id).map(|entry| entry.value().clone())
    }

    fn lookup_tracked_user(&self, channel_id: i64) -> Result<Arc<User>> {
        self.watched_users
            .get(&channel_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(KickError::NotTracked { channel_id })
    }

    async fn fetch_user(&self, slug: &str) -> Result<User> {
        match &self.fetcher {
            Some(fetcher) => fetcher.fetch_user(slug).await,
            None => Err(KickError::RequestFailed(
                "no user fetcher configured".to_string(),
            )),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetcher;

    #[async_trait]
    impl UserFetcher for StaticFetcher {
        async fn fetch_user(&self, slug: &str) -> Result<User> {
            Ok(User::new(77, slug, "Streamer", 10))
        }
    }

    #[test]
    fn test_chatroom_lookup() {
        let registry = Registry::new();
        assert!(registry.lookup_chatroom(5).is_none());

        registry.add_chatroom(Chatroom::new(5, Some(50)));
        assert_eq!(registry.lookup_chatroom(5).unwrap().channel_id, Some(50));

        registry.remove_chatroom(5);
        assert!(registry.lookup_chatroom(5).is_none());
    }

    #[test]
    fn test_untracked_user_is_reported() {
        let registry = Registry::new();
        match registry.lookup_tracked_user(42) {
            Err(KickError::NotTracked { channel_id }) => assert_eq!(channel_id, 42),
            other => panic!("expected NotTracked, got {:?}", other),
        }
    }

    #[test]
    fn test_watch_returns_shared_handle() {
        let registry = Registry::new();
        let watched = registry.watch_user(User::new(5, "streamer", "Streamer", 3));
        let looked_up = registry.lookup_tracked_user(5).unwrap();
        assert!(Arc::ptr_eq(&watched, &looked_up));

        registry.unwatch_user(5);
        assert!(!registry.is_watching(5));
    }

    #[tokio::test]
    async fn test_fetch_without_fetcher_fails() {
        let registry = Registry::new();
        assert!(matches!(
            registry.fetch_user("someone").await,
            Err(KickError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_delegates_to_fetcher() {
        let registry = Registry::with_fetcher(Arc::new(StaticFetcher));
        let user = registry.fetch_user("streamer").await.unwrap();
        assert_eq!(user.id(), 77);
        assert_eq!(user.slug(), "streamer");
    }
}
