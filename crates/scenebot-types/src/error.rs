use std::path::PathBuf;

use thiserror::Error;

use crate::llm::GenerationError;

/// Errors raised while compiling a scenario document.
///
/// All three are fatal at startup: without a scenario no session is created.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("malformed scenario: {0}")]
    Malformed(String),

    #[error("scenario parse error: {0}")]
    Parse(String),
}

/// Errors raised while binding a bot's prompt for one message.
#[derive(Debug, Error)]
pub enum BindError {
    /// The template references a placeholder the bot has no input for.
    ///
    /// A successfully compiled scenario never produces this; seeing it means the
    /// model and the template disagree.
    #[error("bot '{bot}' references unbound placeholder '{{{placeholder}}}'")]
    UnboundPlaceholder { bot: String, placeholder: String },
}

/// Errors from the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("registration rejected: {0}")]
    Registration(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("connection closed")]
    Closed,
}

/// Errors from handling one chat event. Logged by the connection loop, never fatal.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unknown bot: {0}")]
    UnknownBot(String),
}
