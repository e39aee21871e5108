use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{transport_error, Provider};
use crate::errors::PlanError;
use crate::wire::GenerationRequest;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    model: String,
    api_key: Option<String>,
    api_base: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(model: String, api_key: Option<String>, api_base: Option<String>, timeout: Duration) -> Self {
        Self {
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: Client::new(),
            timeout,
        }
    }
}

/// Gemini takes an OpenAPI subset: upper-case type names and no
/// `additionalProperties`.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| k.as_str() != "additionalProperties")
                .map(|(k, v)| match (k.as_str(), v) {
                    ("type", Value::String(t)) => (k.clone(), Value::String(t.to_uppercase())),
                    _ => (k.clone(), to_gemini_schema(v)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

fn first_candidate_text(resp: GenerateResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default()
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<String, PlanError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PlanError::MissingCredentials(self.name().into()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![Part { text: &req.prompt }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(&req.schema),
            },
        };

        tracing::debug!(model = %self.model, "gemini: POST generateContent");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("gemini", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("gemini", e))?;
        if !status.is_success() {
            return Err(PlanError::GenerationUnavailable(format!("gemini API error ({status}): {text}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| PlanError::GenerationUnavailable(format!("unreadable gemini envelope: {e}")))?;

        let content = first_candidate_text(parsed);
        if content.trim().is_empty() {
            return Err(PlanError::GenerationUnavailable("gemini returned no content".into()));
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_conversion_strips_and_uppercases() {
        let converted = to_gemini_schema(&crate::prompt::plan_schema());
        assert_eq!(converted["type"], "OBJECT");
        assert!(converted.get("additionalProperties").is_none());
        let item = &converted["properties"]["breakdown"]["items"];
        assert_eq!(item["type"], "OBJECT");
        assert_eq!(item["properties"]["amount"]["type"], "NUMBER");
        assert!(item.get("additionalProperties").is_none());
        assert_eq!(converted["required"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(first_candidate_text(resp), "{\"a\":1}");
    }

    #[test]
    fn no_candidates_is_empty_text() {
        let resp: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(first_candidate_text(resp), "");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // Unroutable base: reaching the network would surface as GenerationUnavailable.
        let p = GeminiProvider::new("m".into(), None, Some("http://127.0.0.1:9".into()), Duration::from_secs(1));
        let us = crate::reference::find_region("US").unwrap();
        let req = crate::prompt::build(
            &us,
            &crate::reference::IncomeBracket::new(3000, Some(6000), ""),
            &crate::reference::default_language(),
        );
        assert_eq!(p.complete(&req).await, Err(PlanError::MissingCredentials("gemini".into())));
    }
}
