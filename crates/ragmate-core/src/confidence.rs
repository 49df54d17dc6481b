//! Confidence estimation for a synthesized result.

use crate::executor::QueryResults;

/// Source characters beyond which the expected context length stops growing.
const SOURCE_VOLUME_CAP: usize = 2_000;
/// Fraction of (capped) source volume a context should reach to count as adequate.
const ADEQUATE_FRACTION: f64 = 0.25;

/// Score how far the caller can trust `synthesized_context`, in `[0, 1]`.
///
/// Returns exactly `0.0` when no sub-query found anything. Otherwise the mean
/// relevance is discounted by sub-query coverage and by how short the
/// context is relative to the material gathered. Pure and deterministic.
pub fn score(results: &QueryResults, synthesized_context: &str) -> f64 {
    let total_queries = results.len();
    let found: Vec<f64> = results
        .values()
        .flatten()
        .map(|r| if r.relevance.is_finite() { r.relevance.clamp(0.0, 1.0) } else { 0.0 })
        .collect();
    if found.is_empty() {
        return 0.0;
    }

    let mean_relevance = found.iter().sum::<f64>() / found.len() as f64;

    let answered = results.values().filter(|list| !list.is_empty()).count();
    let coverage = answered as f64 / total_queries as f64;

    let source_chars: usize = results
        .values()
        .flatten()
        .map(|r| r.content.chars().count())
        .sum();
    let expected = source_chars.min(SOURCE_VOLUME_CAP) as f64 * ADEQUATE_FRACTION;
    let adequacy = if expected <= 0.0 {
        1.0
    } else {
        (synthesized_context.chars().count() as f64 / expected).min(1.0)
    };

    let score = mean_relevance * (0.5 + 0.5 * coverage) * (0.6 + 0.4 * adequacy);
    score.clamp(0.0, 1.0)
}
