//! Typed views over event payloads.
//!
//! Every entity wraps a [`Payload`](crate::payload::Payload) and, where it
//! needs cross references, a [`ResolverHandle`](crate::resolver::ResolverHandle).
//! Fields are projected on access; derived fields are computed once.

pub mod author;
pub mod chatroom;
pub mod livestream;
pub mod message;
pub mod moderation;
pub mod users;

pub use author::{Author, PartialAuthor};
pub use chatroom::Chatroom;
pub use livestream::PartialLivestream;
pub use message::{Message, PartialMessage, PinnedMessage};
pub use moderation::{MessageDeletedEventData, UserBannedEventData, UserUnbannedEventData};
pub use users::{PartialUser, User};
