//! Ollama generation backend.
//!
//! Provides [`OllamaBackend`], which implements
//! [`GenerationBackend`](scenebot_core::llm::GenerationBackend) against a local
//! Ollama server's `/api/generate` endpoint, with optional NDJSON streaming.

pub mod client;
pub mod types;

pub use client::{OllamaBackend, OllamaConfig};
