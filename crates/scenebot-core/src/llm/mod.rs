//! Generation backend abstraction.

pub mod backend;
pub mod box_backend;

pub use backend::GenerationBackend;
pub use box_backend::{BoxGenerationBackend, GenerationBackendDyn};
