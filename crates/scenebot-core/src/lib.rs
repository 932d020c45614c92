//! Scenario-driven conversation orchestration for scenebot.
//!
//! This crate compiles scenario documents into prompt bindings, decides per
//! chat event whether a bot replies, drives the generation backend and splits
//! replies into transport-sized messages. It defines the ports
//! ([`llm::GenerationBackend`], [`transport::Transport`]) that
//! `scenebot-infra` implements, and never depends on that crate.

pub mod arbiter;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod scenario;
pub mod transport;

#[cfg(test)]
mod test_support;
