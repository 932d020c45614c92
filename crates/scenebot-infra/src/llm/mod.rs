//! Generation backend implementations.

pub mod ollama;

pub use ollama::{OllamaBackend, OllamaConfig};
