//! Error types for the StartupLeadScout core.
//!
//! Uses `thiserror` for public API error types. `ResearchError` is the
//! caller-visible taxonomy of the `/research` endpoint; its `Display` text is
//! exactly the `detail` string returned to the client.

use axum::http::StatusCode;

/// Top-level error type for the core library.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Research error: {0}")]
    Research(#[from] ResearchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of a single research call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResearchError {
    /// The caller sent a blank idea.
    #[error("Idea must not be empty.")]
    EmptyIdea,

    /// No upstream credential was configured at startup.
    #[error("API key not configured.")]
    MissingApiKey,

    /// Anything that went wrong talking to the upstream API: non-2xx status,
    /// timeout, or transport failure. `message` is the upstream diagnostic text.
    #[error("Perplexity API error: {message}")]
    Upstream { message: String },
}

impl ResearchError {
    /// Wrap upstream diagnostic text, appended verbatim to the detail prefix.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// HTTP status surfaced to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyIdea => StatusCode::BAD_REQUEST,
            Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether the failure points at the deployment or the upstream rather
    /// than at the caller's input.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::EmptyIdea)
    }
}

/// Reasons the upstream completion could not be read as a schema-conforming
/// object. Never surfaced to callers; the gateway falls back to the raw body.
#[derive(Debug, thiserror::Error)]
pub enum SchemaDecodeError {
    #[error("response has no choices[0].message.content string")]
    MissingContent,

    #[error("completion content is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("completion content is not an object")]
    NotAnObject,

    #[error("field '{field}' is missing or has the wrong type")]
    NotConforming { field: &'static str },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

/// A type alias for results using the top-level `ScoutError`.
pub type Result<T> = std::result::Result<T, ScoutError>;
