//! # Research
//!
//! Turns a free-text startup idea into a Reddit-sourced market summary by
//! forwarding it to the upstream search API with a fixed prompt and response
//! schema.

mod client;
mod gateway;
pub mod prompt;

pub use client::{PerplexityClient, ResearchProvider};
pub use gateway::{ResearchGateway, ResearchOutcome, extract_structured, interpret_response};
pub use prompt::UpstreamRequest;

use serde::{Deserialize, Serialize};

/// Body of `POST /research`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub idea: String,
}
