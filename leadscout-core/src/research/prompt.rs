//! Fixed request template sent to the upstream search API.
//!
//! Everything except the user's idea is constant.

use serde::Serialize;
use serde_json::{Value, json};

/// Upstream model identifier.
pub const MODEL: &str = "sonar-pro";

/// Sources the upstream search is restricted to.
pub const SEARCH_DOMAIN_FILTER: &[&str] = &["reddit.com"];

/// Recency window for upstream search results, in days.
pub const RECENCY_DAYS: u32 = 730;

/// Amount of search context the upstream pulls in per query.
pub const SEARCH_CONTEXT_SIZE: &str = "high";

/// Fields every schema-conforming research object carries.
pub const REQUIRED_FIELDS: [&str; 4] = ["summary", "sentiment", "pain_points", "suggested_features"];

pub const SYSTEM_PROMPT: &str = "You are a research assistant. Only use Reddit posts and comments. \
Analyze the sentiment around the following startup idea, extract main pain points, \
summarize what people are talking about, and list key features people are excited for. \
Output a JSON object with fields: summary, sentiment, pain_points, suggested_features.";

/// JSON schema the upstream is asked to conform to.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "sentiment": { "type": "string" },
            "pain_points": { "type": "array", "items": { "type": "string" } },
            "suggested_features": { "type": "array", "items": { "type": "string" } }
        },
        "required": REQUIRED_FIELDS,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaSpec {
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub json_schema: JsonSchemaSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSearchOptions {
    pub search_context_size: &'static str,
}

/// Payload for one upstream chat completion. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    pub model: &'static str,
    pub messages: Vec<ChatMessage>,
    pub search_domain_filter: Vec<&'static str>,
    pub recency_days: u32,
    pub response_format: ResponseFormat,
    pub web_search_options: WebSearchOptions,
}

impl UpstreamRequest {
    /// Build the payload for an idea. The idea is passed through as-is.
    pub fn for_idea(idea: &str) -> Self {
        Self {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: idea.to_string(),
                },
            ],
            search_domain_filter: SEARCH_DOMAIN_FILTER.to_vec(),
            recency_days: RECENCY_DAYS,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaSpec {
                    schema: response_schema(),
                },
            },
            web_search_options: WebSearchOptions {
                search_context_size: SEARCH_CONTEXT_SIZE,
            },
        }
    }

    /// The user's idea as carried in the payload.
    pub fn idea(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}
