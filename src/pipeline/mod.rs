use std::sync::Arc;

use crate::cache::PlanCache;
use crate::errors::PlanError;
use crate::key::{build_key, PlanKey};
use crate::prompt;
use crate::provider::GenerationClient;
use crate::reference::{IncomeBracket, Language, Region};
use crate::wire::Plan;

/// Key -> cache -> prompt -> generate -> cache.
pub struct Pipeline {
    cache: Arc<PlanCache>,
    client: GenerationClient,
}

impl Pipeline {
    pub fn new(cache: Arc<PlanCache>, client: GenerationClient) -> Self {
        Self { cache, client }
    }

    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    /// Cached plan for the triple, generating it on a miss. Only validated
    /// plans are stored; errors leave the cache untouched.
    pub async fn run(
        &self,
        region: &Region,
        bracket: &IncomeBracket,
        language: &Language,
    ) -> Result<Arc<Plan>, PlanError> {
        let key = build_key(region, bracket, language);
        if let Some(plan) = self.cache.get(&key) {
            tracing::debug!(key = %key, "serving plan from cache");
            return Ok(plan);
        }

        // Declared before the lock so the gate is released after it, on every exit.
        let _release = GateRelease { cache: self.cache.as_ref(), key: &key };
        let _held = self.cache.gate(&key).lock_owned().await;

        // Another caller may have filled the entry while we waited.
        if let Some(plan) = self.cache.get(&key) {
            tracing::debug!(key = %key, "plan generated by concurrent request");
            return Ok(plan);
        }

        let req = prompt::build(region, bracket, language);
        tracing::info!(
            key = %key,
            provider = self.client.provider_name(),
            template = ?req.template,
            target_income = req.target_income,
            "generating plan"
        );
        match self.client.generate(&key, &req).await {
            Ok(plan) => {
                let plan = Arc::new(plan);
                self.cache.put(key.clone(), plan.clone());
                tracing::info!(key = %key, categories = plan.breakdown.len(), "plan cached");
                Ok(plan)
            }
            Err(e) => {
                tracing::info!(key = %key, error = %e, "plan generation failed");
                Err(e)
            }
        }
    }
}

/// Drops the key's gate once a run ends, including when the run is cancelled.
struct GateRelease<'a> {
    cache: &'a PlanCache,
    key: &'a PlanKey,
}

impl Drop for GateRelease<'_> {
    fn drop(&mut self) {
        self.cache.release_gate(self.key);
    }
}
