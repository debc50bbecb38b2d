//! [`merge`]: URL-level dedup, provenance attachment, and relevance-first
//! ranking of the dispatcher's successful per-adapter responses.

use std::collections::HashSet;

use tokio::time::Instant;

use crate::model::{QueryParams, SearchResponse, SearchResult};

/// Merge an ordered list of successful per-adapter responses into a single
/// envelope.
///
/// - Attaches provenance: every result's `source` is overwritten with its
///   owning response's `source`.
/// - Deduplicates by exact URL equality, keeping the first occurrence in
///   concatenation order — since that order is the dispatcher's invocation
///   order (= registry relevance order), the more relevant source wins
///   ties.
/// - Stable-sorts by the comparator in [`compare_results`].
/// - `total_results` is the sum of every adapter's `total_results`;
///   `search_time_ms` is measured from `dispatch_start`; `source` is the
///   comma-join of every response's `source`, in order.
#[must_use]
pub fn merge(responses: Vec<SearchResponse>, query: QueryParams, dispatch_start: Instant) -> SearchResponse {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut merged_results: Vec<SearchResult> = Vec::new();
    let mut total_results: u64 = 0;
    let mut sources: Vec<String> = Vec::with_capacity(responses.len());

    for response in &responses {
        total_results += response.total_results;
        sources.push(response.source.clone());
        for result in &response.results {
            if seen_urls.insert(result.url.clone()) {
                let mut owned = result.clone();
                owned.source = response.source.clone();
                merged_results.push(owned);
            }
        }
    }

    merged_results.sort_by(compare_results);

    SearchResponse {
        query,
        results: merged_results,
        total_results,
        search_time_ms: u64::try_from(Instant::now().duration_since(dispatch_start).as_millis())
            .unwrap_or(u64::MAX),
        source: sources.join(","),
    }
}

/// Comparator used for the merge's stable sort:
///
/// - If both results carry a `relevance_score`, higher wins.
/// - If only one carries a `relevance_score`, it wins (the undefined side
///   is treated as `-inf`).
/// - If neither does, lower `rank` wins (`rank` defaults to 100 when
///   absent).
#[must_use]
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> std::cmp::Ordering {
    match (a.relevance_score, b.relevance_score) {
        (Some(sa), Some(sb)) => sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.rank.unwrap_or(100).cmp(&b.rank.unwrap_or(100)),
    }
}

/// The effective, normalised relevance used by [`filter_by_relevance`]:
/// `relevance_score` if defined, else `1.0 - rank.unwrap_or(100) / 100.0`,
/// clamped to `[0, 1]`.
#[must_use]
fn effective_score(result: &SearchResult) -> f64 {
    result
        .relevance_score
        .unwrap_or_else(|| 1.0 - f64::from(result.rank.unwrap_or(100)) / 100.0)
        .clamp(0.0, 1.0)
}

/// Keep only results whose effective relevance score is `>= min_score`.
///
/// Example: ranks `[1, 3, 5]` with no `relevance_score` and
/// `min_score = 0.96` keeps ranks `1` and `3` (effective scores `0.99` and
/// `0.97`), drops rank `5` (`0.95`).
#[must_use]
pub fn filter_by_relevance(results: Vec<SearchResult>, min_score: f64) -> Vec<SearchResult> {
    results.into_iter().filter(|r| effective_score(r) >= min_score).collect()
}
