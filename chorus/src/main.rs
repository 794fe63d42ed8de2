#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use args::{Args, Command};
use chorus_config::Config;
use chorus_core::Mode;
use chorus_providers::{CredentialSource, StaticCredentials};
use chorus_router::{JsonFileStore, Router, UsageLedger, UsageStore};
use clap::Parser;
use tokio_util::sync::CancellationToken;

/// Exit code when every selected provider failed
const TOTAL_FAILURE_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(format) = args.log_format {
        config.telemetry.format = format.into();
    }

    chorus_telemetry::init(&config.telemetry)?;

    tracing::debug!(config_path = %args.config.display(), "configuration loaded");

    let ledger = Arc::new(open_ledger(&config)?);

    match args.command {
        Command::Route { mode, json, text } => route(&config, ledger, mode, json, &text.join(" ")).await,
        Command::Usage { json } => {
            print_usage(&ledger, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_ledger(config: &Config) -> anyhow::Result<UsageLedger> {
    match &config.ledger.path {
        Some(path) => {
            let store: Arc<dyn UsageStore> = Arc::new(JsonFileStore::new(path));
            Ok(UsageLedger::load_from(store)?)
        }
        None => Ok(UsageLedger::new()),
    }
}

async fn route(config: &Config, ledger: Arc<UsageLedger>, mode: Mode, json: bool, text: &str) -> anyhow::Result<ExitCode> {
    let credentials: Arc<dyn CredentialSource> = Arc::new(StaticCredentials::from_config(&config.providers));
    let router = Router::from_config(config, &credentials, Arc::clone(&ledger))?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let flush_stop = CancellationToken::new();
    let flusher = ledger.spawn_flusher(config.ledger.flush_every()?, flush_stop.clone());

    let result = router.route_with_cancel(text, mode, &shutdown).await;

    flush_stop.cancel();
    if let Err(e) = flusher.await {
        tracing::warn!(error = %e, "usage flusher did not stop cleanly");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.content);
    }

    if result.is_total_failure() {
        return Ok(ExitCode::from(TOTAL_FAILURE_EXIT));
    }

    Ok(ExitCode::SUCCESS)
}

fn print_usage(ledger: &UsageLedger, json: bool) -> anyhow::Result<()> {
    let snapshot = ledger.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("no usage recorded");
        return Ok(());
    }

    let width = snapshot.keys().map(String::len).max().unwrap_or(0).max("provider".len());
    println!("{:<width$}  {:>12}  {:>10}  {:>10}", "provider", "tokens", "requests", "failures");
    for (id, entry) in &snapshot {
        println!(
            "{id:<width$}  {:>12}  {:>10}  {:>10}",
            entry.tokens, entry.requests, entry.failures
        );
    }

    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received, cancelling in-flight providers");
}
