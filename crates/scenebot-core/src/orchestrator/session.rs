//! ScenarioSession: owns the shared state of one running scenario.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use scenebot_types::config::{ChunkPolicy, GlobalConfig};
use scenebot_types::error::OrchestratorError;
use scenebot_types::event::ChatEvent;
use scenebot_types::scenario::ScenarioModel;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use super::bot::{BotOrchestrator, ConnectionStats};
use crate::arbiter::ReplyArbiter;
use crate::llm::BoxGenerationBackend;
use crate::transport::Transport;

/// Tunables applied to every bot of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub cooldown: Duration,
    pub chunking: ChunkPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default())
    }
}

impl SessionSettings {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            cooldown: config.reply.cooldown(),
            chunking: config.chunking,
        }
    }
}

/// One running scenario: the compiled model, the backend and a reply arbiter
/// per channel, shared by every bot orchestrator it creates.
pub struct ScenarioSession {
    id: Uuid,
    scenario: Arc<ScenarioModel>,
    backend: Arc<BoxGenerationBackend>,
    arbiters: DashMap<String, Arc<ReplyArbiter>>,
    settings: SessionSettings,
    cancel: CancellationToken,
}

impl ScenarioSession {
    pub fn new(
        scenario: ScenarioModel,
        backend: BoxGenerationBackend,
        settings: SessionSettings,
    ) -> Self {
        let id = Uuid::now_v7();
        info!(
            session = %id,
            scenario = %scenario.name,
            bots = scenario.bots.len(),
            backend = backend.name(),
            "Scenario session created"
        );
        Self {
            id,
            scenario: Arc::new(scenario),
            backend: Arc::new(backend),
            arbiters: DashMap::new(),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scenario(&self) -> &ScenarioModel {
        &self.scenario
    }

    /// The arbiter for `channel`, created on first use. Channel names compare
    /// case-insensitively.
    pub fn arbiter(&self, channel: &str) -> Arc<ReplyArbiter> {
        self.arbiters
            .entry(channel.to_lowercase())
            .or_insert_with(|| {
                Arc::new(ReplyArbiter::new(
                    channel,
                    self.scenario.group_size(),
                    self.settings.cooldown,
                ))
            })
            .clone()
    }

    /// Orchestrator for the named bot on the scenario channel.
    pub fn orchestrator_for(&self, bot_name: &str) -> Result<BotOrchestrator, OrchestratorError> {
        let bot = self
            .scenario
            .bot(bot_name)
            .cloned()
            .ok_or_else(|| OrchestratorError::UnknownBot(bot_name.to_string()))?;

        Ok(BotOrchestrator::new(
            self.id,
            Arc::clone(&self.scenario),
            bot,
            self.arbiter(&self.scenario.channel_target()),
            Arc::clone(&self.backend),
            self.settings.chunking,
        ))
    }

    /// One orchestrator per bot, in declaration order.
    pub fn orchestrators(&self) -> Vec<BotOrchestrator> {
        self.scenario
            .bot_names()
            .filter_map(|name| self.orchestrator_for(name).ok())
            .collect()
    }

    /// Drive one connection until it disconnects, its event channel closes or
    /// the session shuts down.
    pub async fn run_connection<T: Transport>(
        &self,
        orchestrator: BotOrchestrator,
        events: mpsc::Receiver<ChatEvent>,
        transport: T,
    ) -> ConnectionStats {
        orchestrator
            .run(events, transport, self.cancel.child_token())
            .await
    }

    /// Stop every connection loop.
    pub fn shutdown(&self) {
        info!(session = %self.id, "Scenario session shutting down");
        self.cancel.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EchoBackend, HEIST, RecordingTransport, scenario};

    fn heist_session() -> ScenarioSession {
        ScenarioSession::new(
            scenario(HEIST),
            BoxGenerationBackend::new(EchoBackend::new()),
            SessionSettings::default(),
        )
    }

    #[test]
    fn settings_follow_config_defaults() {
        let settings = SessionSettings::default();
        assert_eq!(settings.cooldown, Duration::from_secs(2));
        assert_eq!(settings.chunking, ChunkPolicy::default());
    }

    #[test]
    fn orchestrators_share_one_arbiter_per_channel() {
        let session = heist_session();
        let orchestrators = session.orchestrators();
        assert_eq!(orchestrators.len(), 2);
        assert_eq!(orchestrators[0].bot_name(), "Alice");
        assert_eq!(orchestrators[1].bot_name(), "Bob");
        assert!(Arc::ptr_eq(orchestrators[0].arbiter(), orchestrators[1].arbiter()));
        assert!(Arc::ptr_eq(
            orchestrators[0].arbiter(),
            &session.arbiter("#HEIST")
        ));
        assert_eq!(orchestrators[0].channel(), "#heist");
        assert!(orchestrators[0].arbiter().is_group());
    }

    #[test]
    fn unknown_bot_is_rejected() {
        let session = heist_session();
        let err = session.orchestrator_for("Mallory").unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownBot(ref name) if name == "Mallory"));
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(heist_session().id(), heist_session().id());
    }

    #[tokio::test]
    async fn shutdown_stops_connection_loops() {
        let session = Arc::new(heist_session());
        let orchestrator = session.orchestrator_for("Alice").unwrap();
        let (tx, rx) = mpsc::channel(4);
        let transport = RecordingTransport::default();

        let runner = {
            let session = Arc::clone(&session);
            let transport = transport.clone();
            tokio::spawn(async move { session.run_connection(orchestrator, rx, transport).await })
        };

        tx.send(ChatEvent::ChannelMessage {
            source: "carol".to_string(),
            channel: "#heist".to_string(),
            text: "hi".to_string(),
        })
        .await
        .unwrap();

        // Wait for the reply before shutting down.
        while transport.sent().is_empty() {
            tokio::task::yield_now().await;
        }
        session.shutdown();
        assert!(session.is_shutting_down());

        let stats = runner.await.unwrap();
        assert_eq!(stats, ConnectionStats { replied: 1, ..ConnectionStats::default() });
    }
}
