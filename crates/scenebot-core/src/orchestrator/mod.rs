//! Per-bot event handling and the session that ties bots together.
//!
//! A [`ScenarioSession`] owns the compiled scenario, the generation backend and
//! one [`ReplyArbiter`](crate::arbiter::ReplyArbiter) per channel. It hands out a
//! [`BotOrchestrator`] per bot; each connection feeds its events to its own
//! orchestrator one at a time.

pub mod bot;
pub mod session;

pub use bot::{BotOrchestrator, ConnectionStats, HandleOutcome};
pub use session::{ScenarioSession, SessionSettings};
