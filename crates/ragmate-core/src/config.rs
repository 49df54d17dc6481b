//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Tunables for indexing, planning, execution and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum characters stored per indexed file
    pub max_content_chars: usize,
    /// Maximum sub-queries accepted from the planner
    pub max_sub_queries: usize,
    /// Maximum sub-queries executed at the same time
    pub max_concurrency: usize,
    /// Maximum results kept per sub-query
    pub max_results_per_query: usize,
    /// Maximum index entries rendered into one execution prompt
    pub max_candidates_per_prompt: usize,
    /// Characters of each file shown in an execution prompt
    pub prompt_snippet_chars: usize,
    pub planning_temperature: f32,
    pub execution_temperature: f32,
    pub synthesis_temperature: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 8_000,
            max_sub_queries: 5,
            max_concurrency: 4,
            max_results_per_query: 10,
            max_candidates_per_prompt: 30,
            prompt_snippet_chars: 1_200,
            planning_temperature: 0.2,
            execution_temperature: 0.0,
            synthesis_temperature: 0.3,
        }
    }
}

impl RagConfig {
    /// Set the per-file content bound.
    pub fn with_max_content_chars(mut self, chars: usize) -> Self {
        self.max_content_chars = chars;
        self
    }

    /// Set the sub-query cap.
    pub fn with_max_sub_queries(mut self, max: usize) -> Self {
        self.max_sub_queries = max.max(1);
        self
    }

    /// Set the fan-out bound.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Set the per-sub-query result cap.
    pub fn with_max_results_per_query(mut self, max: usize) -> Self {
        self.max_results_per_query = max;
        self
    }

    /// Set the prompt candidate cap.
    pub fn with_max_candidates_per_prompt(mut self, max: usize) -> Self {
        self.max_candidates_per_prompt = max;
        self
    }
}
