//! scenebot entry point.
//!
//! Binary name: `scenebot`
//!
//! Parses CLI arguments, initializes tracing, then dispatches to the command
//! handler.

mod cli;
mod commands;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "scenebot", &mut std::io::stdout());
        return Ok(());
    }

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn,scenebot_core=info,scenebot_infra=info,scenebot=info",
        1 => "info,scenebot_core=debug,scenebot_infra=debug,scenebot=debug",
        _ => "trace",
    };
    let enable_otel = matches!(&cli.command, Commands::Run(args) if args.otel);
    init_tracing(filter, enable_otel)?;

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.quiet).await,
        Commands::Check { scenario, json } => commands::check::check(&scenario, json),
        Commands::Completions { .. } => Ok(()),
    };

    scenebot_observe::shutdown_tracing();
    result
}

fn init_tracing(filter: &str, enable_otel: bool) -> anyhow::Result<()> {
    scenebot_observe::init_tracing(filter, enable_otel)
        .map_err(|e| anyhow::anyhow!(e).context("failed to initialize tracing"))
}
