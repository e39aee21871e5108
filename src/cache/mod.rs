//! In-process plan cache.
//!
//! One entry per [`PlanKey`], last write wins, no eviction. The cache is an
//! explicit value owned by whoever builds the pipeline; there is no global
//! instance. Besides the entries it hands out per-key generation gates so
//! concurrent misses for the same key wait for one generation instead of
//! racing.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::key::PlanKey;
use crate::wire::Plan;

#[derive(Default)]
pub struct PlanCache {
    entries: RwLock<HashMap<PlanKey, Arc<Plan>>>,
    gates: Mutex<HashMap<PlanKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PlanKey) -> Option<Arc<Plan>> {
        self.entries.read().get(key).cloned()
    }

    pub fn put(&self, key: PlanKey, plan: Arc<Plan>) {
        self.entries.write().insert(key, plan);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Gate serialising generation for `key`. Hold its lock across the
    /// miss-generate-put sequence.
    pub fn gate(&self, key: &PlanKey) -> Arc<tokio::sync::Mutex<()>> {
        self.gates.lock().entry(key.clone()).or_default().clone()
    }

    /// Drop the gate for `key` if nobody else holds a handle to it.
    pub fn release_gate(&self, key: &PlanKey) {
        let mut gates = self.gates.lock();
        if gates.get(key).is_some_and(|g| Arc::strong_count(g) == 1) {
            gates.remove(key);
        }
    }

    /// Keys with a generation currently running or waiting.
    pub fn gate_count(&self) -> usize {
        self.gates.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(lang: &str) -> PlanKey {
        PlanKey { region: "US".into(), min: 3000, max: Some(6000), language: lang.into() }
    }

    fn plan(summary: &str) -> Arc<Plan> {
        Arc::new(Plan {
            estimated_monthly_income: 5000.0,
            currency: "USD".into(),
            breakdown: vec![],
            summary: summary.into(),
            actionable_tips: vec![],
            investment_advice: String::new(),
            quote: String::new(),
            life_goal: String::new(),
        })
    }

    #[test]
    fn get_on_empty_cache_is_none() {
        let cache = PlanCache::new();
        assert!(cache.get(&key("en")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn get_returns_the_same_allocation() {
        let cache = PlanCache::new();
        let p = plan("first");
        cache.put(key("en"), p.clone());
        assert!(Arc::ptr_eq(&cache.get(&key("en")).unwrap(), &p));
    }

    #[test]
    fn second_put_overwrites() {
        let cache = PlanCache::new();
        cache.put(key("en"), plan("first"));
        cache.put(key("en"), plan("second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("en")).unwrap().summary, "second");
    }

    #[test]
    fn languages_are_separate_entries() {
        let cache = PlanCache::new();
        cache.put(key("en"), plan("english"));
        cache.put(key("es"), plan("spanish"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("es")).unwrap().summary, "spanish");
    }

    #[test]
    fn gates_are_shared_per_key_and_released() {
        let cache = PlanCache::new();
        let a = cache.gate(&key("en"));
        let b = cache.gate(&key("en"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &cache.gate(&key("fr"))));
        cache.release_gate(&key("fr"));

        cache.release_gate(&key("en"));
        assert_eq!(cache.gate_count(), 1);
        drop(a);
        drop(b);
        cache.release_gate(&key("en"));
        assert_eq!(cache.gate_count(), 0);
    }
}
