//! Command handlers for the `scenebot` binary.

pub mod check;
pub mod run;
