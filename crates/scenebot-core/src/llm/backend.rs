//! GenerationBackend trait definition.
//!
//! Backends receive a fully bound prompt and return the raw generated text.
//! Sanitization and chunking happen afterwards in the orchestrator.

use scenebot_types::llm::GenerationError;
use scenebot_types::prompt::BoundPrompt;

/// Trait for local text-generation backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Wrap an
/// implementation in [`BoxGenerationBackend`](super::BoxGenerationBackend) for
/// runtime selection.
///
/// Implementations live in scenebot-infra (e.g., `OllamaBackend`).
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Render the bound prompt and generate a reply.
    fn generate(
        &self,
        prompt: &BoundPrompt,
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}
