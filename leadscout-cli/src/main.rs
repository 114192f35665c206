//! StartupLeadScout — API server and command-line client.
//!
//! `leadscout` (or `leadscout serve`) runs the HTTP API; `leadscout research`
//! runs a single idea through the same gateway from the terminal.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// StartupLeadScout: Reddit sentiment research for startup ideas
#[derive(Parser, Debug)]
#[command(name = "leadscout", version, about, long_about = None)]
pub struct Cli {
    /// Host to bind the API server to
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to bind the API server to
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Workspace directory (reads `.leadscout/config.toml` and `.env` from here)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Research a single idea and print the JSON result
    Research {
        /// The startup idea to research
        idea: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML (API key redacted)
    Show,
}

fn init_tracing(verbose: u8, quiet: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "leadscout", "leadscout")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    if std::fs::create_dir_all(&log_dir).is_err() {
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    }
    let file_appender = tracing_appender::rolling::daily(&log_dir, "leadscout.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env from the workspace first, then from the current directory.
    let _ = dotenvy::from_path(cli.workspace.join(".env"));
    let _ = dotenvy::dotenv();

    let _guard = init_tracing(cli.verbose, cli.quiet);

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = commands::resolve_config(&cli, &workspace)?;
    let command = cli.command.clone().unwrap_or(Commands::Serve);
    commands::handle_command(command, config).await
}
