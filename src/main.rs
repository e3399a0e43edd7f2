// revstats - Resumable revision statistics extraction
// Copyright (c) 2025 Revstats Contributors
// Licensed under the MIT License

use clap::Parser;
use revstats::cli::{commands, Cli, EXIT_CONFIG, EXIT_FATAL, EXIT_INTERRUPTED};
use revstats::config::load_config;
use revstats::logging::init_logging;
use std::process;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Optional; a missing .env is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match load_config(&cli.options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            process::exit(EXIT_CONFIG);
        }
    };
    if let Err(e) = cli.apply_overrides(&mut config) {
        eprintln!("{e}");
        process::exit(EXIT_CONFIG);
    }

    let _log_guard = match init_logging(&config.application.log_level, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_CONFIG);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.options.display(),
        "revstats - resumable revision statistics extraction"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_timeout = Duration::from_secs(config.extract.shutdown_timeout_secs);

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received, finishing the current batch");
        eprintln!("\nShutdown signal received, completing current batch...");
        let _ = shutdown_tx.send(true);

        tokio::time::sleep(shutdown_timeout).await;
        tracing::error!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Current batch did not finish in time, exiting"
        );
        process::exit(EXIT_INTERRUPTED);
    });

    let result = if cli.status {
        commands::status::execute(&cli, &config).await
    } else {
        commands::extract::execute(&cli, &config, shutdown_rx).await
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    drop(_log_guard);
    process::exit(exit_code);
}

/// Resolve on SIGINT, or SIGTERM on unix
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
