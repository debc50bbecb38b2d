//! Brave Search adapter. Requires `BRAVE_API_KEY`; the only adapter the
//! process refuses to start without (see [`crate::config::Config`]).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{retry_after, url_encode};
use crate::adapter::{map_http_status, AdapterContract};
use crate::cache::{cache_key, Cache, CacheLookup};
use crate::model::{QueryCategory, QueryParams, SearchError, SearchResponse, SearchResult};

const BASE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

pub struct BraveAdapter {
    client: reqwest::Client,
    api_key: String,
    cache: Arc<Cache>,
    categories: HashSet<QueryCategory>,
}

impl BraveAdapter {
    #[must_use]
    pub fn new(api_key: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            cache,
            categories: [
                QueryCategory::General,
                QueryCategory::Programming,
                QueryCategory::Technical,
                QueryCategory::Qa,
            ]
            .into_iter()
            .collect(),
        }
    }

    fn parse_results(body: &Value) -> Vec<SearchResult> {
        body["web"]["results"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, entry)| {
                let url = entry["url"].as_str()?.to_string();
                Some(SearchResult {
                    id: format!("brave:{url}"),
                    title: entry["title"].as_str().unwrap_or_default().to_string(),
                    url,
                    snippet: entry["description"].as_str().unwrap_or_default().to_string(),
                    published: entry["age"].as_str().and_then(|s| s.parse().ok()),
                    rank: Some(index as u32 + 1),
                    source: "brave".to_string(),
                    source_type: Some("web".to_string()),
                    relevance_score: None,
                })
            })
            .filter(SearchResult::has_valid_url)
            .collect()
    }
}

#[async_trait]
impl AdapterContract for BraveAdapter {
    fn id(&self) -> &str {
        "brave"
    }

    fn name(&self) -> &str {
        "Brave Search"
    }

    fn supported_categories(&self) -> &HashSet<QueryCategory> {
        &self.categories
    }

    fn relevance_score(&self, _query: &str, category: QueryCategory) -> f64 {
        match category {
            QueryCategory::General => 0.9,
            QueryCategory::Programming | QueryCategory::Technical => 0.7,
            QueryCategory::Qa => 0.6,
            QueryCategory::Web3 | QueryCategory::Academic => 0.0,
        }
    }

    async fn search(&self, params: &QueryParams) -> Result<SearchResponse, SearchError> {
        let key = cache_key(
            self.id(),
            &params.q,
            params.max_results,
            params.country.as_deref(),
            params.language.as_deref(),
        );
        if let CacheLookup::Hit(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let mut url = format!(
            "{BASE_URL}?q={}&count={}",
            url_encode(&params.q),
            params.max_results
        );
        if let Some(country) = &params.country {
            url.push_str(&format!("&country={}", url_encode(country)));
        }

        let response = self
            .client
            .get(&url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| SearchError::Network(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let after = retry_after(&response);
            return Err(map_http_status(status, after, self.name()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| SearchError::Network(format!("invalid Brave response body: {error}")))?;

        let results = Self::parse_results(&body);
        let result = SearchResponse {
            query: params.clone(),
            total_results: results.len() as u64,
            results,
            search_time_ms: 0,
            source: self.id().to_string(),
        };
        self.cache.set_default_ttl(key, result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_expected_categories() {
        let adapter = BraveAdapter::new("key", Arc::new(Cache::new()));
        assert!(adapter.supported_categories().contains(&QueryCategory::General));
        assert!(adapter.supported_categories().contains(&QueryCategory::Programming));
        assert!(!adapter.supported_categories().contains(&QueryCategory::Web3));
    }

    #[test]
    fn parses_web_results() {
        let body = serde_json::json!({
            "web": {
                "results": [
                    {"title": "T", "url": "https://ex.com/1", "description": "D"}
                ]
            }
        });
        let results = BraveAdapter::parse_results(&body);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "T");
        assert_eq!(results[0].rank, Some(1));
    }

    #[test]
    fn skips_entries_missing_url() {
        let body = serde_json::json!({"web": {"results": [{"title": "T"}]}});
        assert!(BraveAdapter::parse_results(&body).is_empty());
    }

    #[test]
    fn skips_entries_with_malformed_url() {
        let body = serde_json::json!({"web": {"results": [{"title": "T", "url": "not a url"}]}});
        assert!(BraveAdapter::parse_results(&body).is_empty());
    }
}
