// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! slotwatch - watches the PE schedule and messages you when a slot opens.
//!
//! All settings come from the environment:
//!
//! ```bash
//! export SLOTWATCH_TELEGRAM_TOKEN=123456:ABC...
//! export SLOTWATCH_CHAT_ID=987654321
//! export SLOTWATCH_LOGIN=student
//! export SLOTWATCH_PASSWORD=...
//! export SLOTWATCH_SEMESTER_ID=...
//!
//! slotwatch            # info logging
//! slotwatch --verbose  # debug logging
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use slotwatch_core::Messenger;
use slotwatch_daemon::{
    CommandChannel, Dispatcher, PollOrchestrator, SessionManager, SlotSource, Supervisor,
};
use slotwatch_fetch::ResourceClient;
use slotwatch_providers::{LoginHelper, TelegramClient};
use slotwatch_store::{Config, CredentialStore};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// slotwatch - free slot notifications.
#[derive(Parser)]
#[command(name = "slotwatch")]
#[command(about = "Watches the PE schedule and sends a Telegram message when a slot opens")]
#[command(version)]
struct Cli {
    /// Verbose output (show debug info).
    #[arg(long, short)]
    verbose: bool,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "slotwatch=debug,info"
    } else {
        "slotwatch=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    info!(?config, "slotwatch starting");
    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let gate = Arc::new(LoginHelper::new(
        &config.login_helper,
        &config.api_base,
        &config.login,
        &config.password,
    ));
    if !gate.is_available() {
        warn!(helper = %config.login_helper, "Login helper not found; sessions cannot be refreshed");
    }

    let store = CredentialStore::new(config.credentials_path());
    let session = Arc::new(SessionManager::load(gate, store).await);
    session.ensure_initial().await;

    let resource = Arc::new(
        ResourceClient::new(config.resource_url()).context("Failed to create schedule client")?,
    );
    let messenger: Arc<dyn Messenger> = Arc::new(
        TelegramClient::new(&config.telegram_token, &config.chat_id)
            .context("Failed to create Telegram client")?,
    );

    let source = SlotSource::new(resource, session);
    let dispatcher = Dispatcher::new(Arc::clone(&messenger), config.booking_url());

    let poller = Arc::new(Mutex::new(PollOrchestrator::new(
        source.clone(),
        dispatcher.clone(),
        config.poll_interval,
    )));
    let commands = Arc::new(Mutex::new(CommandChannel::new(
        messenger,
        dispatcher,
        source,
        config.chat_id.clone(),
    )));

    let supervisor = Supervisor::default();

    let poll_task = supervisor.supervise("poller", move || {
        let poller = Arc::clone(&poller);
        async move { poller.lock().await.run().await }
    });
    let command_task = supervisor.supervise("commands", move || {
        let commands = Arc::clone(&commands);
        async move { commands.lock().await.run().await }
    });

    tokio::select! {
        () = poll_task => warn!("Poll supervisor stopped"),
        () = command_task => warn!("Command supervisor stopped"),
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
    }

    Ok(())
}
