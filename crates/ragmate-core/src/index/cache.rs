//! Session result cache.

use crate::{QueryPlan, QueryResult};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct CacheState {
    /// scope -> plan
    plans: HashMap<String, QueryPlan>,
    /// (scope, query_id) -> results
    results: HashMap<(String, String), Vec<QueryResult>>,
}

/// Memoizes plans per intent scope and results per sub-query.
///
/// Each `(scope, query_id)` entry is written at most once; later writes for
/// the same key are ignored, so concurrent sub-queries can populate it
/// without coordination.
#[derive(Default)]
pub struct ResultCache {
    state: RwLock<CacheState>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_plan(&self, scope: &str) -> Option<QueryPlan> {
        self.read().plans.get(scope).cloned()
    }

    pub fn put_plan(&self, scope: &str, plan: &QueryPlan) {
        self.write()
            .plans
            .entry(scope.to_string())
            .or_insert_with(|| plan.clone());
    }

    pub fn get_results(&self, scope: &str, query_id: &str) -> Option<Vec<QueryResult>> {
        self.read()
            .results
            .get(&(scope.to_string(), query_id.to_string()))
            .cloned()
    }

    pub fn put_results(&self, scope: &str, query_id: &str, results: &[QueryResult]) {
        self.write()
            .results
            .entry((scope.to_string(), query_id.to_string()))
            .or_insert_with(|| results.to_vec());
    }

    /// Number of cached result lists.
    pub fn len(&self) -> usize {
        self.read().results.len()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.read();
        state.results.is_empty() && state.plans.is_empty()
    }

    /// Drop every cached plan and result.
    pub fn clear(&self) {
        let mut state = self.write();
        state.plans.clear();
        state.results.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
