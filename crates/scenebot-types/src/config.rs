//! Global configuration types for scenebot.
//!
//! `GlobalConfig` represents the optional `scenebot.toml` that controls the chat
//! server, reply cooldown, response chunking and the generation backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration. Every section and field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub server: ServerConfig,
    pub reply: ReplyConfig,
    pub chunking: ChunkPolicy,
    pub backend: BackendConfig,
}

/// Chat server the bots connect to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6667,
        }
    }
}

/// Group reply debounce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// How long a group stays in cooldown after one of its bots replied.
    pub cooldown_ms: u64,
}

impl ReplyConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self { cooldown_ms: 2_000 }
    }
}

/// Limits used to split long replies into transport-sized messages.
///
/// `max_bytes` is compared against the UTF-8 length of the whole reply;
/// `chunk_size` and `chunk_overlap` are measured in characters. None of them
/// account for the framing the transport adds around each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkPolicy {
    pub max_bytes: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 480,
            chunk_size: 450,
            chunk_overlap: 50,
        }
    }
}

/// Generation backend endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            request_timeout_secs: 300,
        }
    }
}
