//! # HTTP Server
//!
//! Axum-based HTTP surface: two fixed diagnostic endpoints and `POST /research`,
//! with CORS for the local web client and request tracing.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AppState, cors_layer, router, run};

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "http://localhost:3001"]
        );
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_server_config_serialization() {
        let config = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9090,
            cors_origins: vec!["https://scout.example".into()],
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.port, 9090);
        assert_eq!(restored.cors_origins.len(), 1);
    }
}
