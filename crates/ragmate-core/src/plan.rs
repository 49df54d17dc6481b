//! Query plan types.

use crate::{ContentHash, Language};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of retrieval a sub-query performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    CodeSearch,
    Documentation,
    ApiReference,
    PatternSearch,
    DependencyGraph,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::CodeSearch => "code_search",
            QueryType::Documentation => "documentation",
            QueryType::ApiReference => "api_reference",
            QueryType::PatternSearch => "pattern_search",
            QueryType::DependencyGraph => "dependency_graph",
        }
    }
}

/// How sub-query results are merged into one context string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStrategy {
    Concatenate,
    Summarize,
    GraphBased,
    Hierarchical,
}

impl SynthesisStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisStrategy::Concatenate => "concatenate",
            SynthesisStrategy::Summarize => "summarize",
            SynthesisStrategy::GraphBased => "graph_based",
            SynthesisStrategy::Hierarchical => "hierarchical",
        }
    }
}

/// Caller-supplied scoping for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Restrict retrieval to files of this language
    pub language: Option<String>,
    /// Restrict retrieval to these path prefixes
    #[serde(default)]
    pub directories: Vec<String>,
}

impl QueryOptions {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directories.push(directory.into());
        self
    }

    /// Build the filters every sub-query of a plan receives.
    ///
    /// An unrecognized language yields an empty extension set.
    pub fn to_filters(&self) -> QueryFilters {
        let file_extensions = self
            .language
            .as_deref()
            .map(|lang| {
                Language::from_str(lang)
                    .extensions()
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let directories = self
            .directories
            .iter()
            .map(|d| normalize_dir(d))
            .filter(|d| !d.is_empty() && d.as_str() != ".")
            .collect();

        QueryFilters {
            file_extensions,
            directories,
        }
    }

    /// Cache scope for an intent under these options.
    pub fn scope_key(&self, intent: &str) -> String {
        let language = self
            .language
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .unwrap_or_default();
        let directories: BTreeSet<String> = self.directories.iter().map(|d| normalize_dir(d)).collect();
        let directories = directories.into_iter().collect::<Vec<_>>().join("\n");

        ContentHash::from_parts(&[
            intent.trim().as_bytes(),
            language.as_bytes(),
            directories.as_bytes(),
        ])
        .to_hex()
    }
}

fn normalize_dir(dir: &str) -> String {
    dir.trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

/// File filters applied before a sub-query touches the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub file_extensions: BTreeSet<String>,
    pub directories: BTreeSet<String>,
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.file_extensions.is_empty() && self.directories.is_empty()
    }

    /// Whether a path passes both filters. An empty filter set admits everything.
    pub fn matches(&self, path: &str) -> bool {
        let ext_ok = self.file_extensions.is_empty()
            || self.file_extensions.iter().any(|ext| path.ends_with(ext.as_str()));

        let path = path.trim_start_matches("./");
        let dir_ok = self.directories.is_empty()
            || self.directories.iter().any(|dir| {
                path.strip_prefix(dir.as_str())
                    .map(|rest| rest.is_empty() || rest.starts_with('/'))
                    .unwrap_or(false)
            });

        ext_ok && dir_ok
    }
}

/// One typed unit of retrieval work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    pub query_id: String,
    pub query_text: String,
    pub query_type: QueryType,
    #[serde(default)]
    pub filters: QueryFilters,
}

/// A decomposed intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub plan_id: String,
    /// The caller's request, verbatim
    pub original_intent: String,
    /// Never empty
    pub sub_queries: Vec<SubQuery>,
    pub synthesis_strategy: SynthesisStrategy,
}

impl QueryPlan {
    /// The plan used whenever planning fails: search the intent itself and
    /// concatenate whatever comes back.
    pub fn fallback(intent: &str, options: &QueryOptions) -> Self {
        Self {
            plan_id: new_plan_id(intent),
            original_intent: intent.to_string(),
            sub_queries: vec![SubQuery {
                query_id: "q1".to_string(),
                query_text: intent.to_string(),
                query_type: QueryType::CodeSearch,
                filters: options.to_filters(),
            }],
            synthesis_strategy: SynthesisStrategy::Concatenate,
        }
    }
}

/// A fresh plan identifier.
pub fn new_plan_id(intent: &str) -> String {
    let now = chrono::Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros() * 1_000);
    let hash = ContentHash::from_parts(&[intent.as_bytes(), &nanos.to_le_bytes()]);
    format!("plan_{}_{}", now.timestamp_millis(), hash.short(8))
}
