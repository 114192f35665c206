//! # StartupLeadScout Core
//!
//! Core library for the StartupLeadScout API.
//! Provides configuration, the error taxonomy, the research gateway that talks
//! to the upstream search API, and the HTTP surface that exposes it.

pub mod config;
pub mod error;
pub mod research;
pub mod server;

// Re-export commonly used types at the crate root.
pub use config::{ScoutConfig, UpstreamConfig, config_exists, load_config};
pub use error::{ConfigError, ResearchError, Result, ScoutError};
pub use research::{
    PerplexityClient, ResearchGateway, ResearchOutcome, ResearchProvider, ResearchRequest,
    UpstreamRequest,
};
pub use server::{AppState, ServerConfig};
