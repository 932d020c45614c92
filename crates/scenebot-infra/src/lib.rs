//! Infrastructure layer for scenebot.
//!
//! Implements the ports defined in `scenebot-core`: the IRC chat transport and
//! the Ollama generation backend. Also loads the global `scenebot.toml`.

pub mod config;
pub mod irc;
pub mod llm;
