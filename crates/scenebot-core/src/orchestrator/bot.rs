//! BotOrchestrator: turns one bot's chat events into replies.

use std::sync::Arc;

use scenebot_types::config::ChunkPolicy;
use scenebot_types::error::OrchestratorError;
use scenebot_types::event::{ChatEvent, Destination};
use scenebot_types::scenario::{BotDef, ScenarioModel};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::arbiter::{ReplyArbiter, ReplyDecision};
use crate::llm::BoxGenerationBackend;
use crate::prompt::bind;
use crate::response::chunk;
use crate::transport::Transport;

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A reply was generated and sent as `chunks` messages.
    Replied {
        destination: Destination,
        chunks: usize,
    },
    /// The group is cooling down, or a sibling bot claimed the reply first.
    Suppressed,
    /// Not for this bot: its own echo, another channel, a sibling bot, or an
    /// empty reply.
    Ignored,
    /// The connection ended.
    Disconnected,
}

/// Counters for one connection loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub replied: usize,
    pub suppressed: usize,
    pub ignored: usize,
    pub failed: usize,
}

impl ConnectionStats {
    fn record(&mut self, outcome: &HandleOutcome) {
        match outcome {
            HandleOutcome::Replied { .. } => self.replied += 1,
            HandleOutcome::Suppressed => self.suppressed += 1,
            HandleOutcome::Ignored => self.ignored += 1,
            HandleOutcome::Disconnected => {}
        }
    }
}

/// Event handler for a single bot of a scenario session.
///
/// Cheap to clone; everything shared lives behind an `Arc`. Created through
/// [`ScenarioSession::orchestrator_for`](super::ScenarioSession::orchestrator_for).
#[derive(Clone)]
pub struct BotOrchestrator {
    session_id: Uuid,
    scenario: Arc<ScenarioModel>,
    bot: Arc<BotDef>,
    arbiter: Arc<ReplyArbiter>,
    backend: Arc<BoxGenerationBackend>,
    chunking: ChunkPolicy,
}

impl BotOrchestrator {
    pub(crate) fn new(
        session_id: Uuid,
        scenario: Arc<ScenarioModel>,
        bot: BotDef,
        arbiter: Arc<ReplyArbiter>,
        backend: Arc<BoxGenerationBackend>,
        chunking: ChunkPolicy,
    ) -> Self {
        Self {
            session_id,
            scenario,
            bot: Arc::new(bot),
            arbiter,
            backend,
            chunking,
        }
    }

    pub fn bot_name(&self) -> &str {
        &self.bot.name
    }

    pub fn channel(&self) -> &str {
        self.arbiter.channel()
    }

    pub fn arbiter(&self) -> &Arc<ReplyArbiter> {
        &self.arbiter
    }

    /// Handle one inbound event, replying through `transport` if warranted.
    pub async fn handle_event<T: Transport>(
        &self,
        event: &ChatEvent,
        transport: &T,
    ) -> Result<HandleOutcome, OrchestratorError> {
        match event {
            ChatEvent::Disconnect { reason } => {
                info!(bot = %self.bot.name, %reason, "Connection closed");
                Ok(HandleOutcome::Disconnected)
            }

            ChatEvent::PrivateMessage { source, text } => {
                if self.is_self(source) {
                    return Ok(HandleOutcome::Ignored);
                }
                debug!(bot = %self.bot.name, %source, "Private message");
                self.reply(text, Destination::User(source.clone()), transport)
                    .await
            }

            ChatEvent::ChannelMessage {
                source,
                channel,
                text,
            } => {
                if !channel.eq_ignore_ascii_case(self.arbiter.channel()) || self.is_self(source) {
                    return Ok(HandleOutcome::Ignored);
                }
                if self.arbiter.is_group() && self.scenario.is_bot(source) {
                    debug!(bot = %self.bot.name, %source, "Ignoring sibling bot");
                    return Ok(HandleOutcome::Ignored);
                }
                if self.scenario.gates_channel() && !self.bot.speaks_in_channel {
                    debug!(bot = %self.bot.name, %channel, "Bot is private-only, channel message ignored");
                    return Ok(HandleOutcome::Ignored);
                }
                if self.arbiter.check() == ReplyDecision::Suppressed {
                    debug!(bot = %self.bot.name, %channel, "Group cooling down, trigger suppressed");
                    return Ok(HandleOutcome::Suppressed);
                }
                self.reply(text, Destination::Channel(channel.clone()), transport)
                    .await
            }
        }
    }

    /// Bind, generate, chunk and send. Channel replies claim the arbiter
    /// window between generation and the first send.
    async fn reply<T: Transport>(
        &self,
        user_message: &str,
        destination: Destination,
        transport: &T,
    ) -> Result<HandleOutcome, OrchestratorError> {
        let prompt = bind(&self.bot, user_message)?;

        let span = info_span!(
            "scenebot.generate",
            session = %self.session_id,
            bot = %self.bot.name,
            backend = self.backend.name(),
        );
        let raw = match self.backend.generate(&prompt).instrument(span).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(bot = %self.bot.name, error = %err, "Generation failed, no reply sent");
                return Err(err.into());
            }
        };

        let messages = chunk(&raw, &self.chunking).into_messages();
        if messages.is_empty() {
            warn!(bot = %self.bot.name, "Backend returned an empty reply");
            return Ok(HandleOutcome::Ignored);
        }

        if matches!(destination, Destination::Channel(_)) && !self.arbiter.claim() {
            debug!(bot = %self.bot.name, "Sibling bot replied first, dropping reply");
            return Ok(HandleOutcome::Suppressed);
        }

        for message in &messages {
            transport.send(&destination, message).await?;
        }

        info!(
            bot = %self.bot.name,
            %destination,
            chunks = messages.len(),
            "Reply sent"
        );
        Ok(HandleOutcome::Replied {
            destination,
            chunks: messages.len(),
        })
    }

    /// Process `events` in arrival order until disconnect, channel close or
    /// cancellation. Event errors are logged and the loop continues.
    pub async fn run<T: Transport>(
        &self,
        mut events: mpsc::Receiver<ChatEvent>,
        transport: T,
        cancel: CancellationToken,
    ) -> ConnectionStats {
        let mut stats = ConnectionStats::default();
        let span = info_span!("scenebot.connection", session = %self.session_id, bot = %self.bot.name);

        async {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Connection loop cancelled");
                        break;
                    }
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => {
                            debug!("Event channel closed");
                            break;
                        }
                    },
                };

                match self.handle_event(&event, &transport).await {
                    Ok(HandleOutcome::Disconnected) => break,
                    Ok(outcome) => stats.record(&outcome),
                    Err(err) => {
                        stats.failed += 1;
                        warn!(error = %err, "Failed to handle chat event");
                    }
                }
            }
        }
        .instrument(span)
        .await;

        info!(
            bot = %self.bot.name,
            replied = stats.replied,
            suppressed = stats.suppressed,
            failed = stats.failed,
            "Connection loop finished"
        );
        stats
    }

    fn is_self(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.bot.name)
    }
}

impl std::fmt::Debug for BotOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotOrchestrator")
            .field("session_id", &self.session_id)
            .field("bot", &self.bot.name)
            .field("channel", &self.arbiter.channel())
            .finish()
    }
}
