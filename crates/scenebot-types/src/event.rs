//! Chat events delivered by a transport and the destinations replies go to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One inbound event on a bot's connection.
///
/// Transports translate their raw frames into this type; the orchestrator
/// dispatches on it with a single `match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A message addressed directly to the bot.
    PrivateMessage { source: String, text: String },

    /// A message posted to a channel the bot has joined.
    ChannelMessage {
        source: String,
        channel: String,
        text: String,
    },

    /// The connection ended.
    Disconnect { reason: String },
}

/// Where an outbound message is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Destination {
    Channel(String),
    User(String),
}

impl Destination {
    /// The raw target identity (channel or nickname).
    pub fn target(&self) -> &str {
        match self {
            Destination::Channel(name) | Destination::User(name) => name,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_tagging() {
        let event = ChatEvent::PrivateMessage {
            source: "carol".to_string(),
            text: "psst".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "private_message");
        assert_eq!(json["source"], "carol");
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(Destination::Channel("#lobby".to_string()).to_string(), "#lobby");
        assert_eq!(Destination::User("carol".to_string()).target(), "carol");
    }
}
