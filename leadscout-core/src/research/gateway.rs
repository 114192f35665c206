//! The research gateway: validates an idea, queries the upstream, and turns
//! the upstream response into the caller-visible result.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::client::{PerplexityClient, ResearchProvider};
use super::prompt::{REQUIRED_FIELDS, UpstreamRequest};
use crate::config::UpstreamConfig;
use crate::error::{ConfigError, ResearchError, SchemaDecodeError};

/// Result of a successful research call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    /// The completion content decoded into a schema-conforming object.
    Structured(Value),
    /// The completion content could not be decoded; the full upstream body.
    Raw(Value),
}

impl ResearchOutcome {
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(v) | Self::Raw(v) => v,
        }
    }
}

/// Stateless per-call gateway. The provider is `None` when no credential was
/// configured at startup.
#[derive(Clone)]
pub struct ResearchGateway {
    provider: Option<Arc<dyn ResearchProvider>>,
}

impl std::fmt::Debug for ResearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchGateway")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl ResearchGateway {
    /// Create a gateway around an upstream provider. `None` means no
    /// credential was configured; every call then fails with `MissingApiKey`.
    pub fn new(provider: Option<Arc<dyn ResearchProvider>>) -> Self {
        Self { provider }
    }

    /// Build a gateway backed by [`PerplexityClient`]. A missing or blank key
    /// yields an unconfigured gateway, not an error.
    pub fn from_config(
        config: &UpstreamConfig,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let provider = match api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => {
                Some(Arc::new(PerplexityClient::new(config, key)?) as Arc<dyn ResearchProvider>)
            }
            None => None,
        };
        Ok(Self::new(provider))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Run one research call for `idea`. Operational failures (missing key,
    /// upstream trouble) are logged before they are returned.
    pub async fn handle(&self, idea: &str) -> Result<ResearchOutcome, ResearchError> {
        self.research(idea).await.inspect_err(|e| {
            if e.is_operational() {
                error!(error = %e, "Research call failed");
            }
        })
    }

    async fn research(&self, idea: &str) -> Result<ResearchOutcome, ResearchError> {
        if idea.trim().is_empty() {
            return Err(ResearchError::EmptyIdea);
        }
        let provider = self.provider.as_ref().ok_or(ResearchError::MissingApiKey)?;

        let request = UpstreamRequest::for_idea(idea);
        let body = provider.search(&request).await?;
        Ok(interpret_response(body))
    }
}

/// Prefer the decoded completion content; fall back to the whole body.
pub fn interpret_response(body: Value) -> ResearchOutcome {
    match extract_structured(&body) {
        Ok(structured) => ResearchOutcome::Structured(structured),
        Err(e) => {
            warn!(reason = %e, "Completion content not schema-conforming; returning raw upstream body");
            ResearchOutcome::Raw(body)
        }
    }
}

/// Decode `choices[0].message.content` into a schema-conforming object.
pub fn extract_structured(body: &Value) -> Result<Value, SchemaDecodeError> {
    let content = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or(SchemaDecodeError::MissingContent)?;

    let decoded: Value = serde_json::from_str(content)?;
    let object = decoded.as_object().ok_or(SchemaDecodeError::NotAnObject)?;
    check_schema(object)?;
    debug!("Completion content decoded into research object");
    Ok(decoded)
}

fn check_schema(object: &Map<String, Value>) -> Result<(), SchemaDecodeError> {
    for field in REQUIRED_FIELDS {
        let ok = match (field, object.get(field)) {
            ("summary" | "sentiment", Some(v)) => v.is_string(),
            (_, Some(Value::Array(items))) => items.iter().all(Value::is_string),
            _ => false,
        };
        if !ok {
            return Err(SchemaDecodeError::NotConforming { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider that returns canned bodies and records every request.
    struct MockProvider {
        response: Result<Value, ResearchError>,
        calls: Mutex<Vec<UpstreamRequest>>,
    }

    impl MockProvider {
        fn returning(response: Result<Value, ResearchError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ResearchProvider for MockProvider {
        async fn search(&self, request: &UpstreamRequest) -> Result<Value, ResearchError> {
            self.calls.lock().unwrap().push(request.clone());
            self.response.clone()
        }
    }

    fn completion(content: &str) -> Value {
        json!({
            "id": "cmpl-1",
            "model": "sonar-pro",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }],
            "citations": ["https://reddit.com/r/coffee"]
        })
    }

    fn gateway_with(mock: &Arc<MockProvider>) -> ResearchGateway {
        ResearchGateway::new(Some(mock.clone() as Arc<dyn ResearchProvider>))
    }

    #[tokio::test]
    async fn test_structured_result_returned_verbatim() {
        let content = r#"{"summary":"...","sentiment":"positive","pain_points":["price"],"suggested_features":["trial size"]}"#;
        let mock = MockProvider::returning(Ok(completion(content)));
        let gateway = gateway_with(&mock);

        let outcome = gateway
            .handle("A subscription box for artisanal coffee")
            .await
            .unwrap();
        assert!(matches!(outcome, ResearchOutcome::Structured(_)));
        assert_eq!(
            outcome.into_value(),
            json!({
                "summary": "...",
                "sentiment": "positive",
                "pain_points": ["price"],
                "suggested_features": ["trial size"]
            })
        );
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            mock.calls.lock().unwrap()[0].idea(),
            "A subscription box for artisanal coffee"
        );
    }

    #[tokio::test]
    async fn test_prose_content_falls_back_to_raw_body() {
        let body = completion("People on Reddit mostly like this idea.");
        let mock = MockProvider::returning(Ok(body.clone()));
        let outcome = gateway_with(&mock).handle("coffee").await.unwrap();
        assert_eq!(outcome, ResearchOutcome::Raw(body));
    }

    #[tokio::test]
    async fn test_empty_idea_never_calls_upstream() {
        let mock = MockProvider::returning(Ok(completion("{}")));
        let gateway = gateway_with(&mock);
        for idea in ["", " ", "\t\n  "] {
            assert_eq!(gateway.handle(idea).await, Err(ResearchError::EmptyIdea));
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let gateway = ResearchGateway::new(None);
        assert!(!gateway.is_configured());
        assert_eq!(
            gateway.handle("coffee").await,
            Err(ResearchError::MissingApiKey)
        );
    }

    #[tokio::test]
    async fn test_blank_idea_checked_before_missing_key() {
        let gateway = ResearchGateway::new(None);
        assert_eq!(gateway.handle("   ").await, Err(ResearchError::EmptyIdea));
    }

    #[tokio::test]
    async fn test_upstream_error_passes_through() {
        let mock = MockProvider::returning(Err(ResearchError::upstream("rate limited")));
        let err = gateway_with(&mock).handle("coffee").await.unwrap_err();
        assert_eq!(err, ResearchError::upstream("rate limited"));
    }

    #[test]
    fn test_extract_missing_content() {
        let body = json!({ "choices": [] });
        assert!(matches!(
            extract_structured(&body),
            Err(SchemaDecodeError::MissingContent)
        ));
        assert!(matches!(
            extract_structured(&json!({})),
            Err(SchemaDecodeError::MissingContent)
        ));
    }

    #[test]
    fn test_extract_rejects_non_conforming_json() {
        let body = completion(r#"{"summary":"ok","sentiment":"mixed","pain_points":"price"}"#);
        assert!(matches!(
            extract_structured(&body),
            Err(SchemaDecodeError::NotConforming {
                field: "pain_points"
            })
        ));

        let body = completion(r#"["not", "an", "object"]"#);
        assert!(matches!(
            extract_structured(&body),
            Err(SchemaDecodeError::NotAnObject)
        ));
    }

    #[test]
    fn test_extract_keeps_extra_fields() {
        let body = completion(
            r#"{"summary":"s","sentiment":"neutral","pain_points":[],"suggested_features":[],"confidence":"low"}"#,
        );
        let value = extract_structured(&body).unwrap();
        assert_eq!(value["confidence"], "low");
    }

    #[test]
    fn test_interpret_missing_content_is_raw() {
        let body = json!({ "object": "chat.completion" });
        assert_eq!(interpret_response(body.clone()), ResearchOutcome::Raw(body));
    }

    #[tokio::test]
    async fn test_from_config_blank_key_is_unconfigured() {
        for key in ["", "   ", "\t\n"] {
            let gateway =
                ResearchGateway::from_config(&UpstreamConfig::default(), Some(key.into())).unwrap();
            assert!(!gateway.is_configured());
            assert_eq!(
                gateway.handle("coffee").await,
                Err(ResearchError::MissingApiKey)
            );
        }
    }

    #[test]
    fn test_from_config_without_key() {
        let gateway = ResearchGateway::from_config(&UpstreamConfig::default(), None).unwrap();
        assert!(!gateway.is_configured());
        let gateway =
            ResearchGateway::from_config(&UpstreamConfig::default(), Some("k".into())).unwrap();
        assert!(gateway.is_configured());
    }
}
