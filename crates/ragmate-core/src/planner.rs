//! Query planner: intent → [`QueryPlan`].

use crate::json::{decode, preview};
use crate::plan::new_plan_id;
use crate::{
    Error, GenerationOptions, QueryOptions, QueryPlan, QueryType, Result, SubQuery,
    SynthesisStrategy, TextGenerator,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Plan shape the model is asked to return. Filters are never read from the
/// model; they are derived from the caller's options.
#[derive(Debug, Deserialize)]
struct PlanPayload {
    #[serde(alias = "subQueries")]
    sub_queries: Vec<SubQueryPayload>,
    #[serde(alias = "synthesisStrategy")]
    synthesis_strategy: SynthesisStrategy,
}

#[derive(Debug, Deserialize)]
struct SubQueryPayload {
    #[serde(alias = "queryText", alias = "query")]
    query_text: String,
    #[serde(alias = "queryType", alias = "type")]
    query_type: QueryType,
}

/// Decomposes an intent into typed sub-queries using the text generator.
pub struct QueryPlanner {
    generator: Arc<dyn TextGenerator>,
    max_sub_queries: usize,
    temperature: f32,
}

impl QueryPlanner {
    pub fn new(generator: Arc<dyn TextGenerator>, max_sub_queries: usize, temperature: f32) -> Self {
        Self {
            generator,
            max_sub_queries: max_sub_queries.max(1),
            temperature,
        }
    }

    /// Plan `intent`. Never fails: any error yields [`QueryPlan::fallback`].
    pub async fn plan(&self, intent: &str, options: &QueryOptions) -> QueryPlan {
        match self.try_plan(intent, options).await {
            Ok(plan) => plan,
            Err(e) => self.fallback(intent, options, &e),
        }
    }

    /// Plan `intent`, reporting generation and validation failures.
    pub async fn try_plan(&self, intent: &str, options: &QueryOptions) -> Result<QueryPlan> {
        let prompt = self.build_prompt(intent, options);
        let gen_options = GenerationOptions::json().with_temperature(self.temperature);

        let response = self.generator.generate(&prompt, &gen_options).await?;
        let payload: PlanPayload = decode(&response).map_err(|e| {
            Error::Planning(format!("{} (response: {})", e, preview(&response)))
        })?;

        let plan = self.validate(intent, options, payload)?;
        debug!(
            "Planned {} sub-queries for '{}' with strategy {}",
            plan.sub_queries.len(),
            intent,
            plan.synthesis_strategy.as_str()
        );
        Ok(plan)
    }

    /// Log `error` and build the single-search fallback plan.
    pub fn fallback(&self, intent: &str, options: &QueryOptions, error: &Error) -> QueryPlan {
        warn!("Planning failed, using fallback plan: {}", error);
        QueryPlan::fallback(intent, options)
    }

    fn validate(&self, intent: &str, options: &QueryOptions, payload: PlanPayload) -> Result<QueryPlan> {
        let filters = options.to_filters();

        let sub_queries: Vec<SubQuery> = payload
            .sub_queries
            .into_iter()
            .filter(|sq| !sq.query_text.trim().is_empty())
            .take(self.max_sub_queries)
            .enumerate()
            .map(|(i, sq)| SubQuery {
                query_id: format!("q{}", i + 1),
                query_text: sq.query_text.trim().to_string(),
                query_type: sq.query_type,
                filters: filters.clone(),
            })
            .collect();

        if sub_queries.is_empty() {
            return Err(Error::Planning("model returned no usable sub-queries".to_string()));
        }

        Ok(QueryPlan {
            plan_id: new_plan_id(intent),
            original_intent: intent.to_string(),
            sub_queries,
            synthesis_strategy: payload.synthesis_strategy,
        })
    }

    fn build_prompt(&self, intent: &str, options: &QueryOptions) -> String {
        let mut scope = String::new();
        if let Some(lang) = &options.language {
            scope.push_str(&format!("Language: {}\n", lang));
        }
        if !options.directories.is_empty() {
            scope.push_str(&format!("Directories: {}\n", options.directories.join(", ")));
        }

        format!(
            r#"You are a query planner for a code retrieval system.
Break the developer intent below into at most {max} focused sub-queries and pick a synthesis strategy.

Developer intent: {intent}
{scope}
Sub-query types:
- code_search: find implementation code
- documentation: find docs, comments and READMEs
- api_reference: find public interfaces and signatures
- pattern_search: find recurring idioms or usages
- dependency_graph: trace imports and module relationships

Synthesis strategies: concatenate, summarize, graph_based, hierarchical.

Respond with JSON only:
{{"sub_queries": [{{"query_text": "...", "query_type": "code_search"}}], "synthesis_strategy": "concatenate"}}"#,
            max = self.max_sub_queries,
            intent = intent,
            scope = scope,
        )
    }
}
