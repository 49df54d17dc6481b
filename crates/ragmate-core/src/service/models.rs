use serde::{Deserialize, Serialize};
use crate::executor::QueryResults;
use crate::QueryPlan;

/// Everything a caller gets back from one query.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgenticRagResult {
    pub plan: QueryPlan,
    /// One entry per sub-query, empty when it failed or found nothing
    pub query_results: QueryResults,
    pub synthesized_context: String,
    pub confidence_score: f64,
}

impl AgenticRagResult {
    /// Total results across sub-queries.
    pub fn result_count(&self) -> usize {
        self.query_results.values().map(Vec::len).sum()
    }
}
