//! boardsync - Task Board Synchronization Service
//!
//! Main entry point for the boardsync CLI.

use boardsync::board::HttpBoard;
use boardsync::config::Config;
use boardsync::server::Server;
use boardsync::sync::{http_sources, run_cycle};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;

/// boardsync - keep a task board in sync with external sources
#[derive(Parser, Debug)]
#[command(name = "boardsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one polling cycle and exit
    Poll,

    /// Start the HTTP server (poll trigger + webhook receiver)
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = boardsync::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Could not read configuration: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Poll => run_poll(config).await,
        Commands::Serve => run_serve(config).await,
    }
}

/// Run a single polling cycle, reporting errors without retrying
async fn run_poll(config: Config) {
    let board = match HttpBoard::new(&config.board) {
        Ok(board) => Arc::new(board),
        Err(e) => {
            tracing::error!("Could not create board client: {}", e);
            process::exit(1);
        }
    };

    let sources = match http_sources(&config) {
        Ok(sources) => sources,
        Err(e) => {
            tracing::error!("Could not build source adapters: {}", e);
            process::exit(1);
        }
    };

    let timezone = match config.timezone() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::error!("Invalid timezone configuration: {}", e);
            process::exit(1);
        }
    };

    let now = Utc::now().with_timezone(&timezone);
    match run_cycle(&config, board, sources, now).await {
        Ok(report) => {
            if report.has_errors() {
                tracing::warn!(
                    errors = report.errors.len(),
                    "polling cycle finished with errors"
                );
            }
        }
        Err(e) => {
            tracing::error!("Polling cycle failed: {}", e);
            process::exit(1);
        }
    }
}

/// Run the HTTP server until terminated
async fn run_serve(config: Config) {
    let server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Could not create server: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server failed: {}", e);
        process::exit(1);
    }
}
