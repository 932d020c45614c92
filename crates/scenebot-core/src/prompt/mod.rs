//! Prompt templates: placeholder extraction, per-message binding and rendering.
//!
//! - `placeholder` -- `{name}` slot extraction shared with the scenario compiler
//! - `binder` -- `bind` a bot definition to one user message, `render` the result

pub mod binder;
pub mod placeholder;

pub use binder::{bind, render};
pub use placeholder::extract_placeholders;
