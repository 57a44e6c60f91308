//! `brewtimer` - guided pour-over brew timer

use clap::Parser;

use brewtimer::cli::args::Cli;
use brewtimer::cli::commands;
use brewtimer::error::ExitCode;
use brewtimer::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format.into(), cli.verbose, cli.color);
    }

    tokio::spawn(async {
        let code = shutdown_signal().await;
        eprintln!();
        std::process::exit(code);
    });

    match commands::dispatch(cli).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Waits for SIGINT or SIGTERM and returns the matching exit code.
#[cfg(unix)]
async fn shutdown_signal() -> i32 {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
        tracing::warn!("failed to register SIGTERM handler");
        let _ = tokio::signal::ctrl_c().await;
        return ExitCode::INTERRUPTED;
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => ExitCode::INTERRUPTED,
        _ = sigterm.recv() => ExitCode::TERMINATED,
    }
}

/// Waits for Ctrl+C.
#[cfg(not(unix))]
async fn shutdown_signal() -> i32 {
    let _ = tokio::signal::ctrl_c().await;
    ExitCode::INTERRUPTED
}
