//! HTTP client for the upstream search API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

use super::prompt::UpstreamRequest;
use crate::config::UpstreamConfig;
use crate::error::{ConfigError, ResearchError};

/// Something that can run an upstream research query and hand back the raw
/// JSON response body.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn search(&self, request: &UpstreamRequest) -> Result<Value, ResearchError>;
}

/// Bearer-authenticated client for a chat-completions style endpoint.
pub struct PerplexityClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for PerplexityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityClient")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl PerplexityClient {
    /// Create a client for `config.endpoint` that bounds every request by
    /// `config.timeout_secs`.
    pub fn new(config: &UpstreamConfig, api_key: String) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
        })
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> ResearchError {
        if err.is_timeout() {
            return ResearchError::upstream(format!(
                "request timed out after {}s ({})",
                self.timeout_secs,
                error_chain(err)
            ));
        }
        ResearchError::upstream(error_chain(err))
    }
}

/// Render an error with its full source chain. reqwest's top-level message
/// hides the interesting part ("connection refused", DNS failure, ...).
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[async_trait]
impl ResearchProvider for PerplexityClient {
    async fn search(&self, request: &UpstreamRequest) -> Result<Value, ResearchError> {
        debug!(
            url = %self.endpoint,
            model = request.model,
            idea_chars = request.idea().chars().count(),
            "Sending upstream research request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(ResearchError::upstream(message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        serde_json::from_str(&body).map_err(|e| {
            ResearchError::upstream(format!("invalid JSON in response body: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let config = UpstreamConfig::default();
        let client = PerplexityClient::new(&config, "pplx-key".to_string()).unwrap();
        assert_eq!(client.endpoint, crate::config::DEFAULT_UPSTREAM_ENDPOINT);
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let client =
            PerplexityClient::new(&UpstreamConfig::default(), "pplx-secret".to_string()).unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("pplx-secret"));
        assert!(rendered.contains("timeout_secs"));
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_upstream_error() {
        // Bind then drop a listener so the port is (very likely) closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = UpstreamConfig {
            endpoint: format!("http://{}/chat/completions", addr),
            timeout_secs: 5,
            ..UpstreamConfig::default()
        };
        let client = PerplexityClient::new(&config, "k".to_string()).unwrap();
        let err = client
            .search(&UpstreamRequest::for_idea("idea"))
            .await
            .unwrap_err();
        match err {
            ResearchError::Upstream { message } => {
                // The source chain carries the OS-level reason.
                assert!(
                    message.contains("Connection refused") || message.contains("connect"),
                    "message was: {}",
                    message
                );
            }
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }
}
