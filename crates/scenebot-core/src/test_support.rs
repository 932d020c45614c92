//! Mock backends and transports shared by the core test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scenebot_types::error::TransportError;
use scenebot_types::event::Destination;
use scenebot_types::llm::GenerationError;
use scenebot_types::prompt::BoundPrompt;
use scenebot_types::scenario::ScenarioModel;

use crate::llm::GenerationBackend;
use crate::prompt::render;
use crate::scenario::compile_str;
use crate::transport::Transport;

/// Returns the rendered prompt as the reply.
pub(crate) struct EchoBackend {
    calls: Arc<AtomicUsize>,
}

impl EchoBackend {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl GenerationBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &BoundPrompt) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        render(prompt).map_err(|e| GenerationError::Backend {
            message: e.to_string(),
        })
    }
}

/// Returns a fixed reply after an optional delay, counting calls.
pub(crate) struct ScriptedBackend {
    reply: String,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub(crate) fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &BoundPrompt) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// Always fails.
pub(crate) struct FailingBackend;

impl GenerationBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &BoundPrompt) -> Result<String, GenerationError> {
        Err(GenerationError::Backend {
            message: "model crashed".to_string(),
        })
    }
}

/// Records every sent message.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    sent: Arc<Mutex<Vec<(Destination, String)>>>,
}

impl RecordingTransport {
    pub(crate) fn sent(&self) -> Vec<(Destination, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, destination: &Destination, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.clone(), text.to_string()));
        Ok(())
    }
}

/// Rejects every send.
pub(crate) struct ClosedTransport;

impl Transport for ClosedTransport {
    async fn send(&self, _destination: &Destination, _text: &str) -> Result<(), TransportError> {
        Err(TransportError::Closed)
    }
}

pub(crate) const HEIST: &str = r#"
<scenario>
  <name>heist</name>
  <channel>heist</channel>
  <bot>
    <name>Alice</name>
    <prompt>You are a guard. Your goal: {user_goal}. Visitor says: {usr_in}</prompt>
    <task>keep the vault closed</task>
    <prompt_items>
      <item><name>user_goal</name><value>protect the vault</value></item>
    </prompt_items>
  </bot>
  <bot>
    <name>Bob</name>
    <prompt>You are a thief. Answer: {usr_in}</prompt>
  </bot>
</scenario>
"#;

pub(crate) const SOLO: &str = r#"
<scenario>
  <name>solo</name>
  <channel>solo</channel>
  <bot>
    <name>Alice</name>
    <prompt>Answer: {usr_in}</prompt>
  </bot>
</scenario>
"#;

pub(crate) fn scenario(source: &str) -> ScenarioModel {
    compile_str(source).unwrap()
}
