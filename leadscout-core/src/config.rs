//! Configuration system for StartupLeadScout.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/leadscout/config.toml` and/or `.leadscout/config.toml`
//! in the workspace directory. The upstream credential itself is read from its own
//! environment variable (`PERPLEXITY_API_KEY` by default) exactly once, at startup.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::server::ServerConfig;

/// Default chat completions endpoint of the upstream search API.
pub const DEFAULT_UPSTREAM_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Upstream search API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Full URL of the chat completions endpoint.
    pub endpoint: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Explicit API key. Takes precedence over `api_key_env` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Bounded wait for the upstream response, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_UPSTREAM_ENDPOINT.to_string(),
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl UpstreamConfig {
    /// Resolve the bearer credential: the explicit `api_key` first, then the
    /// environment variable named by `api_key_env`. Blank values are treated
    /// as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl ScoutConfig {
    /// Reject values that would make the server unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.upstream.endpoint.starts_with("https://")
            || self.upstream.endpoint.starts_with("http://"))
        {
            return Err(ConfigError::Invalid {
                message: format!(
                    "upstream.endpoint must be an http(s) URL, got '{}'",
                    self.upstream.endpoint
                ),
            });
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "upstream.timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.server.cors_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                message: "server.cors_origins must not contain blank entries".to_string(),
            });
        }
        Ok(())
    }

    /// Copy of the configuration that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.upstream.api_key.is_some() {
            config.upstream.api_key = Some("***".to_string());
        }
        config
    }
}

/// Config files consulted, lowest precedence first: the per-user file, then
/// the workspace's `.leadscout/config.toml`.
fn config_files(workspace: Option<&Path>) -> Vec<PathBuf> {
    let user = directories::ProjectDirs::from("dev", "leadscout", "leadscout")
        .map(|dirs| dirs.config_dir().join("config.toml"));
    let local = workspace.map(|ws| ws.join(".leadscout").join("config.toml"));
    user.into_iter().chain(local).collect()
}

/// Load configuration from all layers.
///
/// Environment variables use the `LEADSCOUT_` prefix and `__` for nesting,
/// e.g. `LEADSCOUT_SERVER__PORT` or `LEADSCOUT_UPSTREAM__TIMEOUT_SECS`.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ScoutConfig>,
) -> Result<ScoutConfig, Box<figment::Error>> {
    let figment = config_files(workspace)
        .into_iter()
        .filter(|path| path.exists())
        .fold(
            Figment::from(Serialized::defaults(ScoutConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(Env::prefixed("LEADSCOUT_").split("__"));

    let figment = match overrides {
        Some(overrides) => figment.merge(Serialized::defaults(overrides)),
        None => figment,
    };
    figment.extract().map_err(Box::new)
}

/// Whether any config file (user-level or workspace-level) exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    config_files(workspace).iter().any(|path| path.exists())
}
