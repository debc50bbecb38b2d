//! [`AdapterContract`]: the uniform capability every search backend exposes
//! to the registry and dispatcher.
//!
//! Concrete adapters (see [`crate::adapters`]) share no code beyond the two
//! helpers here: HTTP status → [`SearchError`] mapping, and cache-key
//! derivation (the latter lives in [`crate::cache::cache_key`]).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::{QueryCategory, QueryParams, SearchError, SearchResponse};

/// Capability exposed by every federated search backend.
///
/// Implementors must honour `max_results` as an upper bound on the number
/// of results returned, and must map transport-level errors per the status
/// table documented on [`map_http_status`].
#[async_trait]
pub trait AdapterContract: Send + Sync {
    /// Stable short id, e.g. `"brave"`. Used in cache keys and provenance.
    fn id(&self) -> &str;

    /// Display name, e.g. `"Brave Search"`.
    fn name(&self) -> &str;

    /// The categories this adapter declares itself useful for.
    fn supported_categories(&self) -> &HashSet<QueryCategory>;

    /// Cheap, stateless relevance score in `[0, 1]` for this adapter against
    /// `query`/`category`. Used by the registry to order adapters within a
    /// category, highest first.
    fn relevance_score(&self, query: &str, category: QueryCategory) -> f64;

    /// Run the search. May block on network I/O; must not exceed
    /// `params.max_results` results.
    async fn search(&self, params: &QueryParams) -> Result<SearchResponse, SearchError>;
}

/// Map an HTTP response status (plus an optional `Retry-After` duration and
/// a short diagnostic body) to a [`SearchError`], per the adapter contract:
///
/// - `401` / `403` → [`SearchError::Authorization`]
/// - `429` → [`SearchError::RateLimit`], honouring `retry_after` when
///   present, else [`SearchError::DEFAULT_RETRY_AFTER_MS`]
/// - any other non-2xx → [`SearchError::Network`]
#[must_use]
pub fn map_http_status(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    adapter_name: &str,
) -> SearchError {
    match status.as_u16() {
        401 | 403 => SearchError::Authorization(format!(
            "{adapter_name} rejected the request ({status})"
        )),
        429 => SearchError::RateLimit {
            retry_after_ms: retry_after
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(SearchError::DEFAULT_RETRY_AFTER_MS),
        },
        _ => SearchError::Network(format!("{adapter_name} returned {status}")),
    }
}

/// Parse a `Retry-After` header value (seconds, per RFC 7231) into a
/// [`Duration`]. HTTP-date values are not supported — the adapters this
/// crate talks to only ever send delay-seconds.
#[must_use]
pub fn parse_retry_after_seconds(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_401_to_authorization() {
        let err = map_http_status(reqwest::StatusCode::UNAUTHORIZED, None, "brave");
        assert!(matches!(err, SearchError::Authorization(_)));
    }

    #[test]
    fn maps_403_to_authorization() {
        let err = map_http_status(reqwest::StatusCode::FORBIDDEN, None, "brave");
        assert!(matches!(err, SearchError::Authorization(_)));
    }

    #[test]
    fn maps_429_with_retry_after() {
        let err = map_http_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(5)),
            "tavily",
        );
        assert!(matches!(err, SearchError::RateLimit { retry_after_ms: 5000 }));
    }

    #[test]
    fn maps_429_without_retry_after_to_default() {
        let err = map_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, None, "tavily");
        assert!(matches!(
            err,
            SearchError::RateLimit { retry_after_ms } if retry_after_ms == SearchError::DEFAULT_RETRY_AFTER_MS
        ));
    }

    #[test]
    fn maps_other_non_2xx_to_network() {
        let err = map_http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, None, "github");
        assert!(matches!(err, SearchError::Network(_)));
    }

    #[test]
    fn parses_retry_after_seconds() {
        assert_eq!(parse_retry_after_seconds("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after_seconds("not-a-number"), None);
    }
}
