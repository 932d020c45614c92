//! Shared domain types for scenebot.
//!
//! This crate contains the types passed between the scenario compiler, the
//! orchestrator and the infrastructure adapters: the compiled scenario model,
//! bound prompts, chat events, global configuration and their error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod prompt;
pub mod scenario;
