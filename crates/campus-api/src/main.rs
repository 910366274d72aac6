//! Campus chat CLI and server entry point.
//!
//! Binary name: `campus`
//!
//! Parses CLI arguments, initializes the database and the hub, then
//! dispatches to the appropriate command or starts the chat server.

mod cli;
mod http;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap_complete::generate;

use campus_core::hub::Hub;
use campus_observe::tracing_setup::{init_tracing, shutdown_tracing, LogFormat, TracingOptions};

use cli::{Cli, Commands};
use state::AppState;

/// How long the history writer may take to flush after the server stops.
const HISTORY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,campus_core=debug,campus_api=debug",
        _ => "trace",
    };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let options = TracingOptions::new(filter)
        .with_format(format)
        .with_otel(cli.otel);
    init_tracing(&options).map_err(|e| anyhow::anyhow!(e))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "campus", &mut std::io::stdout());
        return Ok(());
    }

    match cli.command {
        Commands::Serve { port, host } => {
            let state = AppState::init(host, port).await?;
            serve(state, cli.quiet).await?;
        }

        Commands::History { limit, offset } => {
            let state = AppState::init(None, None).await?;
            cli::history::list_history(&state, limit, offset, cli.json).await?;
        }

        Commands::Status => {
            let state = AppState::init(None, None).await?;
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    shutdown_tracing();
    Ok(())
}

/// Run the chat server until Ctrl+C or SIGTERM, then drain history.
async fn serve(state: AppState, quiet: bool) -> anyhow::Result<()> {
    let (state, writer) = state.with_recorder();
    let hub = Arc::clone(&state.hub);
    let db_pool = state.db_pool.clone();

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        %addr,
        queue_capacity = state.config.outbound_capacity,
        "Chat server listening"
    );
    if !quiet {
        println!(
            "  {} Campus chat listening on {}",
            console::style("💬").bold(),
            console::style(format!("ws://{addr}/ws")).cyan()
        );
        println!(
            "  {}",
            console::style("Press Ctrl+C to stop").dim()
        );
    }

    let app = http::router::build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(hub))
    .await?;

    // Sessions still holding the recorder end once their peers hang up.
    match tokio::time::timeout(HISTORY_DRAIN_TIMEOUT, writer).await {
        Ok(Ok(persisted)) => tracing::info!(persisted, "History writer drained"),
        Ok(Err(err)) => tracing::error!(error = %err, "History writer task failed"),
        Err(_) => tracing::warn!("History writer still busy at shutdown; pending messages dropped"),
    }
    db_pool.close().await;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then close every session queue.
async fn shutdown_signal(hub: Arc<Hub>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    let closed = hub.shutdown();
    tracing::info!(closed, "Shutting down chat hub");
}
