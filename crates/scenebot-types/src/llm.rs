//! Generation backend types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Hardware the generation backend should run the model on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Gpu,
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Gpu => write!(f, "gpu"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpu" => Ok(Device::Gpu),
            "cpu" => Ok(Device::Cpu),
            other => Err(format!("invalid device: '{other}'")),
        }
    }
}

/// How generation work is placed: a device, or a CPU thread count.
///
/// The two are mutually exclusive on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Placement {
    Device(Device),
    Threads(u32),
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Threads(1)
    }
}

/// Errors from a generation backend call. The core never retries these.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("backend error: {message}")]
    Backend { message: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}
