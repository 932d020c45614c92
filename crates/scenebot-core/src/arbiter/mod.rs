//! Reply debounce for bots sharing a channel.
//!
//! Every bot orchestrator of one scenario session on one channel holds the same
//! [`ReplyArbiter`]. After any of them sends a group reply the arbiter enters
//! cooldown, and channel triggers are suppressed until it elapses. This keeps
//! co-located bots from answering each other indefinitely.
//!
//! The debounce is best-effort: two bots may both pass [`ReplyArbiter::check`]
//! for the same message, and only the first to [`ReplyArbiter::claim`] the
//! window sends its reply. State lives behind a `std::sync::Mutex` that is
//! never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Observable arbiter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterPhase {
    /// No recent group reply.
    Idle,
    /// A group reply was just sent; further channel triggers are suppressed.
    Cooldown,
}

/// Whether a channel trigger may go on to generate a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDecision {
    Proceed,
    Suppressed,
}

/// Cooldown bookkeeping for one bot group on one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyState {
    pub has_replied_in_window: bool,
    pub cooldown_deadline: Option<Instant>,
    /// Incremented per claimed window so a stale timer cannot end a newer one.
    window: u64,
}

impl ReplyState {
    /// Fall back to idle if the deadline passed without the timer firing.
    fn expire(&mut self, now: Instant) {
        if self.cooldown_deadline.is_some_and(|deadline| deadline <= now) {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.has_replied_in_window = false;
        self.cooldown_deadline = None;
    }
}

/// Per-group, per-channel reply arbiter.
pub struct ReplyArbiter {
    channel: String,
    group_size: usize,
    cooldown: Duration,
    state: Arc<Mutex<ReplyState>>,
}

impl ReplyArbiter {
    /// Create an idle arbiter for `group_size` bots on `channel`.
    pub fn new(channel: impl Into<String>, group_size: usize, cooldown: Duration) -> Self {
        Self {
            channel: channel.into(),
            group_size,
            cooldown,
            state: Arc::new(Mutex::new(ReplyState::default())),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether more than one bot shares the channel. Single bots never cool down.
    pub fn is_group(&self) -> bool {
        self.group_size > 1
    }

    /// Current phase.
    pub fn phase(&self) -> ArbiterPhase {
        let mut state = self.lock();
        state.expire(Instant::now());
        if state.has_replied_in_window {
            ArbiterPhase::Cooldown
        } else {
            ArbiterPhase::Idle
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> ReplyState {
        let mut state = self.lock();
        state.expire(Instant::now());
        *state
    }

    /// Decide whether an eligible channel trigger may generate a reply.
    pub fn check(&self) -> ReplyDecision {
        if !self.is_group() {
            return ReplyDecision::Proceed;
        }
        match self.phase() {
            ArbiterPhase::Idle => ReplyDecision::Proceed,
            ArbiterPhase::Cooldown => ReplyDecision::Suppressed,
        }
    }

    /// Take the reply window just before sending a group reply.
    ///
    /// Returns `false` if another bot of the group claimed it first. On success
    /// the group enters cooldown and a timer returns it to idle after the
    /// cooldown; the caller is never blocked by it. Must be called from within a
    /// tokio runtime.
    pub fn claim(&self) -> bool {
        if !self.is_group() {
            return true;
        }

        let now = Instant::now();
        let window = {
            let mut state = self.lock();
            state.expire(now);
            if state.has_replied_in_window {
                return false;
            }
            state.has_replied_in_window = true;
            state.cooldown_deadline = Some(now + self.cooldown);
            state.window += 1;
            state.window
        };

        debug!(channel = %self.channel, cooldown = ?self.cooldown, "Group reply window claimed");

        let state = Arc::clone(&self.state);
        let cooldown = self.cooldown;
        let channel = self.channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.window == window {
                state.reset();
                debug!(%channel, "Group reply cooldown elapsed");
            }
        });

        true
    }

    fn lock(&self) -> MutexGuard<'_, ReplyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ReplyArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyArbiter")
            .field("channel", &self.channel)
            .field("group_size", &self.group_size)
            .field("cooldown", &self.cooldown)
            .field("phase", &self.phase())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
