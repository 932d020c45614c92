//! `scenebot run`: connect every bot of a scenario and converse until
//! interrupted.

use std::sync::Arc;

use anyhow::Context;
use console::style;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use scenebot_core::llm::BoxGenerationBackend;
use scenebot_core::orchestrator::{ConnectionStats, ScenarioSession, SessionSettings};
use scenebot_core::scenario::compile;
use scenebot_infra::config::load_global_config;
use scenebot_infra::irc::IrcTransport;
use scenebot_infra::llm::{OllamaBackend, OllamaConfig};

use crate::cli::RunArgs;

const QUIT_MESSAGE: &str = "scene over";

pub async fn run(args: RunArgs, quiet: bool) -> anyhow::Result<()> {
    let config = load_global_config(&args.config).await;

    let scenario = compile(&args.scenario)
        .with_context(|| format!("failed to compile scenario {}", args.scenario.display()))?;

    let host = args.server.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let mut backend_config = OllamaConfig::from_backend_config(&config.backend);
    if let Some(model) = args.model {
        backend_config.model = model;
    }
    backend_config.placement = args.placement.placement();
    backend_config.print_stream = args.printstream;
    let model = backend_config.model.clone();

    let backend = OllamaBackend::new(backend_config).context("failed to create generation backend")?;
    if args.download {
        backend
            .ensure_model()
            .await
            .with_context(|| format!("failed to download model '{model}'"))?;
    }

    let channel = scenario.channel_target();
    let session = Arc::new(ScenarioSession::new(
        scenario,
        BoxGenerationBackend::new(backend),
        SessionSettings::from_config(&config),
    ));

    let mut connections = JoinSet::new();
    for orchestrator in session.orchestrators() {
        let nick = orchestrator.bot_name().to_string();
        let (transport, events) = IrcTransport::connect(&host, port, &nick)
            .await
            .with_context(|| format!("bot '{nick}' failed to connect to {host}:{port}"))?;
        transport
            .join(&channel)
            .await
            .with_context(|| format!("bot '{nick}' failed to join {channel}"))?;

        let session = Arc::clone(&session);
        connections.spawn(async move {
            let stats = session
                .run_connection(orchestrator, events, transport.clone())
                .await;
            let _ = transport.quit(QUIT_MESSAGE).await;
            (nick, stats)
        });
    }

    if !quiet {
        let bots: Vec<&str> = session.scenario().bot_names().collect();
        println!();
        println!(
            "  {} Scenario '{}' running on {} ({})",
            style("▶").green().bold(),
            style(&session.scenario().name).cyan(),
            style(&channel).bold(),
            bots.join(", ")
        );
        println!(
            "  {}",
            style(format!("{host}:{port} · model {model} · Ctrl+C to stop")).dim()
        );
        println!();
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown, if !session.is_shutting_down() => {
                info!("Shutdown signal received");
                session.shutdown();
            }
            joined = connections.join_next() => match joined {
                Some(result) => report_connection(result),
                None => break,
            },
        }
    }

    info!(session = %session.id(), "All connections closed");
    Ok(())
}

fn report_connection(result: Result<(String, ConnectionStats), JoinError>) {
    match result {
        Ok((bot, stats)) => info!(
            %bot,
            replied = stats.replied,
            suppressed = stats.suppressed,
            ignored = stats.ignored,
            failed = stats.failed,
            "Bot connection finished"
        ),
        Err(err) => warn!(error = %err, "Bot connection task failed"),
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
