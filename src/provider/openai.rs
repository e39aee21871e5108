use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{transport_error, Provider};
use crate::errors::PlanError;
use crate::wire::GenerationRequest;

const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI chat-completions provider. The prompt goes out as a single user
/// message and the plan schema as a strict `json_schema` response format.
pub struct OpenAIProvider {
    model: String,
    api_key: Option<String>,
    api_base: String,
    client: Client,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(model: String, api_key: Option<String>, api_base: Option<String>, timeout: Duration) -> Self {
        Self {
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: Client::new(),
            timeout,
        }
    }

    fn body(&self, req: &GenerationRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": req.prompt }
            ],
            "temperature": 0.4,
            "response_format": {
                "type": "json_schema",
                "json_schema": { "name": "budget_plan", "strict": true, "schema": req.schema }
            }
        })
    }
}

// Minimal structs to parse the chat response
#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<String, PlanError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PlanError::MissingCredentials(self.name().into()))?;

        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        tracing::debug!(model = %self.model, "openai: POST chat/completions");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&self.body(req))
            .send()
            .await
            .map_err(|e| transport_error("openai", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("openai", e))?;
        if !status.is_success() {
            return Err(PlanError::GenerationUnavailable(format!("OpenAI API error ({status}): {text}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| PlanError::GenerationUnavailable(format!("unreadable OpenAI envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| PlanError::GenerationUnavailable("OpenAI returned no content".into()))
    }
}
