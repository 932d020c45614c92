//! Ollama HTTP API types.

use serde::{Deserialize, Serialize};

use scenebot_types::llm::{Device, Placement};

/// `num_gpu` value that offloads every layer.
const ALL_GPU_LAYERS: i32 = 999;

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

/// Runtime options controlling where the model runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<i32>,
}

impl From<Placement> for GenerateOptions {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Threads(n) => Self {
                num_thread: Some(n),
                num_gpu: None,
            },
            Placement::Device(Device::Cpu) => Self {
                num_thread: None,
                num_gpu: Some(0),
            },
            Placement::Device(Device::Gpu) => Self {
                num_thread: None,
                num_gpu: Some(ALL_GPU_LAYERS),
            },
        }
    }
}

/// One object of a `/api/generate` response. Non-streaming responses are a
/// single object with `done: true`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request body for `POST /api/pull`.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub model: String,
    pub stream: bool,
}

/// Final status of a non-streaming pull.
#[derive(Debug, Clone, Deserialize)]
pub struct PullResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Splits a byte stream into newline-delimited JSON objects.
///
/// Network chunks do not respect line boundaries, so partial lines are
/// buffered until their newline arrives.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    /// Feed bytes and return every complete line decoded.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<GenerateChunk, serde_json::Error>> {
        self.buffer.extend_from_slice(bytes);
        let mut decoded = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(chunk) = decode_line(&line) {
                decoded.push(chunk);
            }
        }
        decoded
    }

    /// Decode whatever is left once the stream ends.
    pub fn finish(mut self) -> Option<Result<GenerateChunk, serde_json::Error>> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Option<Result<GenerateChunk, serde_json::Error>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_maps_to_options() {
        assert_eq!(
            GenerateOptions::from(Placement::Threads(4)),
            GenerateOptions {
                num_thread: Some(4),
                num_gpu: None
            }
        );
        assert_eq!(
            GenerateOptions::from(Placement::Device(Device::Cpu)).num_gpu,
            Some(0)
        );
        assert_eq!(
            GenerateOptions::from(Placement::Device(Device::Gpu)).num_gpu,
            Some(ALL_GPU_LAYERS)
        );
    }

    #[test]
    fn request_serializes_only_set_options() {
        let request = GenerateRequest {
            model: "mistral".to_string(),
            prompt: "hi".to_string(),
            stream: false,
            options: Placement::Threads(2).into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "mistral");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_thread"], 2);
        assert!(json["options"].get("num_gpu").is_none());
    }

    #[test]
    fn decoder_handles_split_lines() {
        let mut decoder = NdjsonDecoder::default();
        let first = decoder.push(b"{\"response\":\"Hel\",\"done\":false}\n{\"resp");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].as_ref().unwrap().response, "Hel");

        let second = decoder.push(b"onse\":\"lo\",\"done\":false}\n\n");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].as_ref().unwrap().response, "lo");

        assert!(decoder.push(b"{\"done\":true}").is_empty());
        let last = decoder.finish().unwrap().unwrap();
        assert!(last.done);
        assert!(last.response.is_empty());
    }

    #[test]
    fn decoder_reports_invalid_json() {
        let mut decoder = NdjsonDecoder::default();
        let decoded = decoder.push(b"not json\n");
        assert!(decoded[0].is_err());
        assert!(decoder.finish().is_none());
    }
}
