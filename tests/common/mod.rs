//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Semaphore;

use budgetwise::cache::PlanCache;
use budgetwise::errors::PlanError;
use budgetwise::pipeline::Pipeline;
use budgetwise::provider::{GenerationClient, Provider};
use budgetwise::reference::{find_language, find_region, IncomeBracket, Language, Region};
use budgetwise::wire::GenerationRequest;

/// Valid plan payload whose summary names the language it was asked for.
pub fn plan_json(language: &str) -> String {
    json!({
        "estimatedMonthlyIncome": 5200,
        "currency": "USD",
        "breakdown": [
            { "name": "Housing", "percentage": 35, "amount": 1820, "color": "#3b82f6" },
            { "name": "Food", "percentage": 15, "amount": 780, "color": "#10b981" },
            { "name": "Transport", "percentage": 10, "amount": 520, "color": "#f97316" },
            { "name": "Utilities", "percentage": 8, "amount": 416, "color": "#eab308" },
            { "name": "Savings", "percentage": 20, "amount": 1040, "color": "#8b5cf6" },
            { "name": "Personal", "percentage": 7, "amount": 364, "color": "#ec4899" },
            { "name": "Health", "percentage": 5, "amount": 260, "color": "#14b8a6" }
        ],
        "summary": format!("plan in {language}"),
        "actionableTips": ["Automate transfers on payday"],
        "investmentAdvice": "Broad index funds.",
        "quote": "A penny saved is a penny earned.",
        "lifeGoal": "Twelve months of emergency savings"
    })
    .to_string()
}

/// Fake generation service. Replies come from a script, then default to a
/// valid plan. With a gate, each call waits for a permit first.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, PlanError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
            delay: None,
        }
    }

    pub fn then(self, reply: Result<String, PlanError>) -> Self {
        self.script.lock().push_back(reply);
        self
    }

    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, req: &GenerationRequest) -> Result<String, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(req.clone());
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(plan_json(&req.language)))
    }
}

pub fn pipeline_with(provider: Arc<ScriptedProvider>) -> Arc<Pipeline> {
    let client = GenerationClient::new(provider);
    Arc::new(Pipeline::new(Arc::new(PlanCache::new()), client))
}

pub fn us() -> Region {
    find_region("US").expect("US region")
}

pub fn mid_bracket() -> IncomeBracket {
    IncomeBracket::new(3000, Some(6000), "$3,000 - $6,000")
}

pub fn lang(code: &str) -> Language {
    find_language(code).expect("language")
}
