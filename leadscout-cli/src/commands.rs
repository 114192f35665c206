//! Subcommand handlers.

use anyhow::Context;
use leadscout_core::server::{self, AppState};
use leadscout_core::{ResearchGateway, ScoutConfig};
use std::path::Path;
use tracing::info;

use crate::{Cli, Commands, ConfigAction};

/// Load layered configuration and apply command-line overrides.
pub fn resolve_config(cli: &Cli, workspace: &Path) -> anyhow::Result<ScoutConfig> {
    let mut config = leadscout_core::load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    apply_overrides(&mut config, cli.host.as_deref(), cli.port);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut ScoutConfig, host: Option<&str>, port: Option<u16>) {
    if let Some(host) = host {
        config.server.host = host.to_string();
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}

/// Resolve the credential once and build the gateway around it.
fn build_gateway(config: &ScoutConfig) -> anyhow::Result<ResearchGateway> {
    let api_key = config.upstream.resolve_api_key();
    if api_key.is_some() {
        info!(env = %config.upstream.api_key_env, "Upstream API key loaded");
    }
    ResearchGateway::from_config(&config.upstream, api_key).context("building upstream client")
}

pub async fn handle_command(command: Commands, config: ScoutConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve => {
            let gateway = build_gateway(&config)?;
            server::run(&config.server, AppState::new(gateway)).await?;
            Ok(())
        }
        Commands::Research { idea } => {
            let gateway = build_gateway(&config)?;
            let outcome = gateway.handle(&idea).await?;
            println!("{}", serde_json::to_string_pretty(&outcome.into_value())?);
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", render_config(&config)?);
                Ok(())
            }
        },
    }
}

fn render_config(config: &ScoutConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(&config.redacted()).context("rendering configuration")
}
