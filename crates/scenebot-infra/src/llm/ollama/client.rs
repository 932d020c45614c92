//! OllamaBackend -- concrete [`GenerationBackend`] for a local Ollama server.
//!
//! Renders the bound prompt and posts it to `/api/generate`. In streaming mode
//! the NDJSON response is echoed token by token to stdout while the full reply
//! is accumulated.

use std::io::Write;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use tracing::{debug, info};

use scenebot_core::llm::GenerationBackend;
use scenebot_core::prompt::render;
use scenebot_types::config::BackendConfig;
use scenebot_types::llm::{GenerationError, Placement};
use scenebot_types::prompt::BoundPrompt;

use super::types::{
    ErrorResponse, GenerateChunk, GenerateRequest, NdjsonDecoder, PullRequest, PullResponse,
};

/// Connection and placement settings for [`OllamaBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub placement: Placement,
    /// Echo generated tokens to stdout as they arrive.
    pub print_stream: bool,
    pub request_timeout: Duration,
}

impl OllamaConfig {
    pub fn from_backend_config(config: &BackendConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            placement: Placement::default(),
            print_stream: false,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Generation backend for the Ollama HTTP API.
pub struct OllamaBackend {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn to_request(&self, prompt: String) -> GenerateRequest {
        GenerateRequest {
            model: self.config.model.clone(),
            prompt,
            stream: self.config.print_stream,
            options: self.config.placement.into(),
        }
    }

    /// Make sure the configured model is present locally, pulling it if needed.
    pub async fn ensure_model(&self) -> Result<(), GenerationError> {
        info!(model = %self.config.model, "Pulling model");
        let body = PullRequest {
            model: self.config.model.clone(),
            stream: false,
        };

        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Http(format!("HTTP request failed: {e}")))?;
        let response = self.check_status(response).await?;

        let pull: PullResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Deserialization(format!("failed to parse pull response: {e}")))?;
        if let Some(error) = pull.error {
            return Err(GenerationError::ModelUnavailable(format!(
                "{}: {error}",
                self.config.model
            )));
        }

        info!(model = %self.config.model, status = %pull.status, "Model ready");
        Ok(())
    }

    /// Map non-2xx statuses to errors, passing successful responses through.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(match status {
            StatusCode::NOT_FOUND => {
                GenerationError::ModelUnavailable(format!("{}: {message}", self.config.model))
            }
            _ => GenerationError::Backend {
                message: format!("HTTP {status}: {message}"),
            },
        })
    }

    async fn read_single(&self, response: reqwest::Response) -> Result<String, GenerationError> {
        let chunk: GenerateChunk = response
            .json()
            .await
            .map_err(|e| GenerationError::Deserialization(format!("failed to parse response: {e}")))?;
        match chunk.error {
            Some(message) => Err(GenerationError::Backend { message }),
            None => Ok(chunk.response),
        }
    }

    async fn read_stream(&self, response: reqwest::Response) -> Result<String, GenerationError> {
        let mut decoder = NdjsonDecoder::default();
        let mut reply = String::new();
        let mut stdout = std::io::stdout();
        let mut bytes = response.bytes_stream();

        while let Some(next) = bytes.next().await {
            let next = next.map_err(|e| GenerationError::Http(format!("stream interrupted: {e}")))?;
            for chunk in decoder.push(&next) {
                append_chunk(&mut reply, &mut stdout, chunk)?;
            }
        }
        if let Some(chunk) = decoder.finish() {
            append_chunk(&mut reply, &mut stdout, chunk)?;
        }
        let _ = writeln!(stdout);

        Ok(reply)
    }
}

fn append_chunk(
    reply: &mut String,
    out: &mut impl Write,
    chunk: Result<GenerateChunk, serde_json::Error>,
) -> Result<(), GenerationError> {
    let chunk = chunk
        .map_err(|e| GenerationError::Deserialization(format!("invalid stream line: {e}")))?;
    if let Some(message) = chunk.error {
        return Err(GenerationError::Backend { message });
    }
    // Echo failures are not generation failures.
    let _ = write!(out, "{}", chunk.response).and_then(|()| out.flush());
    reply.push_str(&chunk.response);
    Ok(())
}

impl GenerationBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &BoundPrompt) -> Result<String, GenerationError> {
        let rendered = render(prompt).map_err(|e| GenerationError::Backend {
            message: e.to_string(),
        })?;
        let body = self.to_request(rendered);
        debug!(
            model = %body.model,
            stream = body.stream,
            prompt_chars = body.prompt.chars().count(),
            "Sending generate request"
        );

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Http(format!("HTTP request failed: {e}")))?;
        let response = self.check_status(response).await?;

        if body.stream {
            self.read_stream(response).await
        } else {
            self.read_single(response).await
        }
    }
}
