use serde::{Deserialize, Serialize};

/// Locally known chatroom handle, as held by a resolver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chatroom {
    pub id: i64,
    pub channel_id: Option<i64>,
}

impl Chatroom {
    pub fn new(id: i64, channel_id: Option<i64>) -> Self {
        Self { id, channel_id }
    }

    /// Pusher topic carrying this chatroom's events.
    pub fn topic(&self) -> String {
        chatroom_topic(self.id)
    }
}

pub(crate) fn chatroom_topic(chatroom_id: i64) -> String {
    format!("chatrooms.{}.v2", chatroom_id)
}

pub(crate) fn channel_topic(channel_id: i64) -> String {
    format!("channel.{}", channel_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names() {
        assert_eq!(Chatroom::new(12, None).topic(), "chatrooms.12.v2");
        assert_eq!(channel_topic(34), "channel.34");
    }
}
