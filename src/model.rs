//! Core data model: query parameters, categories, results, responses, and
//! the error taxonomy shared by every adapter and the dispatcher.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of results requested when the caller omits `maxResults`.
pub const DEFAULT_MAX_RESULTS: u32 = 20;
pub const MIN_MAX_RESULTS: u32 = 1;
pub const MAX_MAX_RESULTS: u32 = 50;

/// Closed set of query categories produced by the classifier and used by
/// the registry to filter/score adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    General,
    Programming,
    Web3,
    Academic,
    Technical,
    Qa,
}

impl QueryCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Programming => "programming",
            Self::Web3 => "web3",
            Self::Academic => "academic",
            Self::Technical => "technical",
            Self::Qa => "qa",
        }
    }
}

impl std::fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recency window for a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Day,
    Week,
    Month,
}

/// Validated, normalised parameters for one federated search request.
///
/// Construct via [`QueryParams::new`], which enforces this type's
/// invariants: `q` non-empty after trim, `maxResults` clamped into range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    pub q: String,
    pub max_results: u32,
    pub country: Option<String>,
    pub language: Option<String>,
    pub freshness: Option<Freshness>,
    pub category: Option<QueryCategory>,
}

impl QueryParams {
    /// Build a `QueryParams`, trimming `q` and clamping `max_results`.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidQuery`] if `q` is empty after trim or
    /// longer than 200 characters.
    pub fn new(q: impl Into<String>, max_results: Option<u32>) -> Result<Self, SearchError> {
        let q = q.into();
        let trimmed = q.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidQuery {
                issues: vec!["query must not be empty".into()],
            });
        }
        if trimmed.chars().count() > 200 {
            return Err(SearchError::InvalidQuery {
                issues: vec!["query must be at most 200 characters".into()],
            });
        }
        let max_results = max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(MIN_MAX_RESULTS, MAX_MAX_RESULTS);
        Ok(Self {
            q: trimmed.to_string(),
            max_results,
            country: None,
            language: None,
            freshness: None,
            category: None,
        })
    }

    /// Attach `country`, a two-letter ISO-3166-1 code.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidQuery`] if `country` is present and not
    /// exactly 2 characters.
    pub fn with_country(mut self, country: Option<String>) -> Result<Self, SearchError> {
        if let Some(code) = &country {
            if code.chars().count() != 2 {
                return Err(SearchError::InvalidQuery {
                    issues: vec!["country must be exactly 2 characters".into()],
                });
            }
        }
        self.country = country;
        Ok(self)
    }

    /// Attach `language`, a 2 to 5 character language code (e.g. `en` or
    /// `en-US`).
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidQuery`] if `language` is present and
    /// its length is outside `2..=5` characters.
    pub fn with_language(mut self, language: Option<String>) -> Result<Self, SearchError> {
        if let Some(code) = &language {
            let len = code.chars().count();
            if !(2..=5).contains(&len) {
                return Err(SearchError::InvalidQuery {
                    issues: vec!["language must be 2 to 5 characters".into()],
                });
            }
        }
        self.language = language;
        Ok(self)
    }

    #[must_use]
    pub fn with_freshness(mut self, freshness: Option<Freshness>) -> Self {
        self.freshness = freshness;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<QueryCategory>) -> Self {
        self.category = category;
        self
    }
}

/// One normalised result from a single adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Opaque, adapter-unique id — stable for a given `(adapter, url)` pair.
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub published: Option<DateTime<Utc>>,
    pub rank: Option<u32>,
    /// Provenance: the adapter id that produced this result. The merger
    /// overrides this unconditionally with the owning response's `source`.
    pub source: String,
    pub source_type: Option<String>,
    pub relevance_score: Option<f64>,
}

impl SearchResult {
    /// `true` iff `url` parses as a syntactically valid absolute URL.
    #[must_use]
    pub fn has_valid_url(&self) -> bool {
        url::Url::parse(&self.url).is_ok()
    }
}

/// The merged or single-adapter response shape returned by the core pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: QueryParams,
    pub results: Vec<SearchResult>,
    pub total_results: u64,
    pub search_time_ms: u64,
    /// Comma-joined adapter ids, in invocation order.
    pub source: String,
}

impl SearchResponse {
    /// The adapter ids this response claims provenance over, in order.
    #[must_use]
    pub fn source_ids(&self) -> Vec<&str> {
        self.source.split(',').filter(|s| !s.is_empty()).collect()
    }
}

/// The sum type of everything that can go wrong fetching or classifying a
/// federated search. Every variant carries a human-readable message; no
/// variant is ever raised as a panic or exception across a component
/// boundary (see design notes).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit: retry after {retry_after_ms}ms")]
    RateLimit { retry_after_ms: u64 },

    #[error("Invalid query: {}", .issues.join(", "))]
    InvalidQuery { issues: Vec<String> },

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Query classification error: {0}")]
    ClassificationError(String),

    #[error("No search provider available: {0}")]
    NoAdapterAvailable(String),
}

impl SearchError {
    /// Default `Retry-After` when an adapter's 429 response omits the header.
    pub const DEFAULT_RETRY_AFTER_MS: u64 = 60_000;

    /// The exact user-visible text for this error. Distinct from
    /// [`Display`](std::fmt::Display), which is aimed at logs and carries
    /// more internal framing.
    #[must_use]
    pub fn mcp_message(&self) -> String {
        match self {
            Self::Network(message) => format!("Network error: {message}"),
            Self::RateLimit { retry_after_ms } => {
                format!("Rate limit: Retry after {} seconds", retry_after_ms / 1000)
            }
            Self::InvalidQuery { issues } => {
                if issues.iter().any(|issue| issue.contains("cannot be properly encoded")) {
                    "This query could not be encoded by the search provider. Try rephrasing \
                     it using Latin-script terms."
                        .to_string()
                } else {
                    format!("Invalid query: {}", issues.join(", "))
                }
            }
            Self::Authorization(message) => message.clone(),
            Self::ClassificationError(message) => format!("Query classification error: {message}"),
            Self::NoAdapterAvailable(message) => format!("No search provider available: {message}"),
        }
    }
}

/// Stable metadata about one registered adapter. Created once at
/// registration; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    pub id: String,
    pub name: String,
    pub supported_categories: HashSet<QueryCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_clamps_max_results_above_range() {
        let params = QueryParams::new("rust", Some(1000)).unwrap();
        assert_eq!(params.max_results, MAX_MAX_RESULTS);
    }

    #[test]
    fn query_params_clamps_max_results_below_range() {
        let params = QueryParams::new("rust", Some(0)).unwrap();
        assert_eq!(params.max_results, MIN_MAX_RESULTS);
    }

    #[test]
    fn query_params_defaults_max_results() {
        let params = QueryParams::new("rust", None).unwrap();
        assert_eq!(params.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn query_params_trims_q() {
        let params = QueryParams::new("  rust async  ", None).unwrap();
        assert_eq!(params.q, "rust async");
    }

    #[test]
    fn query_params_rejects_blank_query() {
        let err = QueryParams::new("   ", None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
    }

    #[test]
    fn query_params_rejects_overlong_query() {
        let long = "a".repeat(201);
        let err = QueryParams::new(long, None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
    }

    #[test]
    fn with_country_accepts_two_chars() {
        let params = QueryParams::new("rust", None).unwrap().with_country(Some("US".into())).unwrap();
        assert_eq!(params.country.as_deref(), Some("US"));
    }

    #[test]
    fn with_country_rejects_wrong_length() {
        let err = QueryParams::new("rust", None).unwrap().with_country(Some("USA".into())).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
    }

    #[test]
    fn with_language_accepts_two_to_five_chars() {
        let params = QueryParams::new("rust", None).unwrap().with_language(Some("en-US".into())).unwrap();
        assert_eq!(params.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn with_language_rejects_single_char() {
        let err = QueryParams::new("rust", None).unwrap().with_language(Some("e".into())).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
    }

    #[test]
    fn with_language_rejects_over_five_chars() {
        let err = QueryParams::new("rust", None).unwrap().with_language(Some("abcdef".into())).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
    }

    #[test]
    fn search_result_validates_url() {
        let mut result = SearchResult {
            id: "1".into(),
            title: "t".into(),
            url: "https://example.com".into(),
            snippet: "s".into(),
            published: None,
            rank: Some(1),
            source: "brave".into(),
            source_type: None,
            relevance_score: None,
        };
        assert!(result.has_valid_url());
        result.url = "not a url".into();
        assert!(!result.has_valid_url());
    }

    #[test]
    fn mcp_message_network() {
        let err = SearchError::Network("timeout".into());
        assert_eq!(err.mcp_message(), "Network error: timeout");
    }

    #[test]
    fn mcp_message_rate_limit_floors_seconds() {
        let err = SearchError::RateLimit { retry_after_ms: 2999 };
        assert_eq!(err.mcp_message(), "Rate limit: Retry after 2 seconds");
    }

    #[test]
    fn mcp_message_invalid_query_encoding_hint() {
        let err = SearchError::InvalidQuery {
            issues: vec!["text cannot be properly encoded for this provider".into()],
        };
        assert!(err.mcp_message().contains("Latin-script"));
    }

    #[test]
    fn mcp_message_invalid_query_other() {
        let err = SearchError::InvalidQuery { issues: vec!["too long".into(), "bad chars".into()] };
        assert_eq!(err.mcp_message(), "Invalid query: too long, bad chars");
    }

    #[test]
    fn mcp_message_authorization_has_no_prefix() {
        let err = SearchError::Authorization("API key revoked".into());
        assert_eq!(err.mcp_message(), "API key revoked");
    }

    #[test]
    fn mcp_message_no_adapter_available() {
        let err = SearchError::NoAdapterAvailable("no adapter for category 'web3'".into());
        assert_eq!(err.mcp_message(), "No search provider available: no adapter for category 'web3'");
    }

    #[test]
    fn source_ids_splits_on_comma() {
        let response = SearchResponse {
            query: QueryParams::new("q", None).unwrap(),
            results: vec![],
            total_results: 0,
            search_time_ms: 0,
            source: "brave,wikipedia".into(),
        };
        assert_eq!(response.source_ids(), vec!["brave", "wikipedia"]);
    }
}
