//! CLI definitions for the `scenebot` binary.
//!
//! Uses clap derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use scenebot_infra::config::DEFAULT_CONFIG_FILE;
use scenebot_types::llm::{Device, Placement};

/// Run scripted multi-bot conversations on an IRC channel.
#[derive(Parser)]
#[command(name = "scenebot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect every bot of a scenario and reply until interrupted.
    Run(RunArgs),

    /// Compile a scenario and report its bots.
    Check {
        /// Path to the scenario XML document.
        scenario: PathBuf,

        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the scenario XML document.
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Model served by the generation backend (overrides the config file).
    #[arg(short, long, env = "SCENEBOT_MODEL")]
    pub model: Option<String>,

    #[command(flatten)]
    pub placement: PlacementArgs,

    /// Echo generated tokens to stdout as they stream in.
    #[arg(long)]
    pub printstream: bool,

    /// Pull the model before connecting.
    #[arg(long)]
    pub download: bool,

    /// IRC server host (overrides the config file).
    #[arg(long, env = "SCENEBOT_SERVER")]
    pub server: Option<String>,

    /// IRC server port (overrides the config file).
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the TOML config file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long)]
    pub otel: bool,
}

/// Where the model runs. `--device` and `--threads` are mutually exclusive.
#[derive(Args)]
#[group(multiple = false)]
pub struct PlacementArgs {
    /// Run the model on this device.
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,

    /// Run the model on this many CPU threads (default 1).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,
}

impl PlacementArgs {
    pub fn placement(&self) -> Placement {
        match (self.device, self.threads) {
            (Some(device), _) => Placement::Device(device.into()),
            (None, Some(threads)) => Placement::Threads(threads),
            (None, None) => Placement::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Gpu,
    Cpu,
}

impl From<DeviceArg> for Device {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Gpu => Device::Gpu,
            DeviceArg::Cpu => Device::Cpu,
        }
    }
}
