//! Scenario documents.
//!
//! - `xml` -- minimal, namespace-agnostic element tree over `quick-xml`
//! - `compiler` -- validates the tree and produces a [`ScenarioModel`]
//!
//! [`ScenarioModel`]: scenebot_types::scenario::ScenarioModel

pub mod compiler;
mod xml;

pub use compiler::{compile, compile_str};
