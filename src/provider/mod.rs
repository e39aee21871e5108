use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::PlanError;
use crate::key::PlanKey;
use crate::log::ArtifactSink;
use crate::wire::{self, GenerationRequest, Plan};

pub mod gemini;
pub mod openai;

/// The generation service boundary: prompt plus schema in, raw JSON text out.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, req: &GenerationRequest) -> Result<String, PlanError>;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(cfg: &Config) -> DynProvider {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(
            cfg.model().to_string(),
            cfg.api_key.clone(),
            cfg.api_base.clone(),
            timeout,
        )),
        ProviderKind::OpenAI => Arc::new(openai::OpenAIProvider::new(
            cfg.model().to_string(),
            cfg.api_key.clone(),
            cfg.api_base.clone(),
            timeout,
        )),
    }
}

fn transport_error(provider: &str, e: reqwest::Error) -> PlanError {
    if e.is_timeout() {
        PlanError::GenerationUnavailable(format!("{provider} request timed out"))
    } else {
        PlanError::GenerationUnavailable(format!("{provider} request failed: {e}"))
    }
}

/// Turns a provider's raw text into a validated [`Plan`]. Never touches the cache.
#[derive(Clone)]
pub struct GenerationClient {
    provider: DynProvider,
    artifacts: Option<ArtifactSink>,
}

impl GenerationClient {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider, artifacts: None }
    }

    pub fn with_artifacts(mut self, sink: Option<ArtifactSink>) -> Self {
        self.artifacts = sink;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn generate(&self, key: &PlanKey, req: &GenerationRequest) -> Result<Plan, PlanError> {
        if let Some(sink) = &self.artifacts {
            if let Err(e) = sink.save_request(key, req) {
                tracing::warn!(key = %key, error = %e, "could not save request artifact");
            }
        }

        let raw = self.provider.complete(req).await?;

        if let Some(sink) = &self.artifacts {
            if let Err(e) = sink.save_response(key, &raw) {
                tracing::warn!(key = %key, error = %e, "could not save response artifact");
            }
        }

        wire::parse_plan(&raw)
    }
}
