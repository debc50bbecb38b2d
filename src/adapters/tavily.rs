//! Tavily adapter. Requires `TAVILY_API_KEY`; registered only when present.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::{map_http_status, AdapterContract};
use crate::cache::{cache_key, Cache, CacheLookup};
use crate::model::{QueryCategory, QueryParams, SearchError, SearchResponse, SearchResult};

const BASE_URL: &str = "https://api.tavily.com/search";

pub struct TavilyAdapter {
    client: reqwest::Client,
    api_key: String,
    cache: Arc<Cache>,
    categories: HashSet<QueryCategory>,
}

impl TavilyAdapter {
    #[must_use]
    pub fn new(api_key: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            cache,
            categories: [QueryCategory::General, QueryCategory::Academic, QueryCategory::Qa]
                .into_iter()
                .collect(),
        }
    }

    fn parse_results(body: &Value) -> Vec<SearchResult> {
        body["results"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, entry)| {
                let url = entry["url"].as_str()?.to_string();
                Some(SearchResult {
                    id: format!("tavily:{url}"),
                    title: entry["title"].as_str().unwrap_or_default().to_string(),
                    url,
                    snippet: entry["content"].as_str().unwrap_or_default().to_string(),
                    published: entry["published_date"].as_str().and_then(|s| s.parse().ok()),
                    rank: Some(index as u32 + 1),
                    source: "tavily".to_string(),
                    source_type: Some("web".to_string()),
                    relevance_score: entry["score"].as_f64(),
                })
            })
            .filter(SearchResult::has_valid_url)
            .collect()
    }
}

#[async_trait]
impl AdapterContract for TavilyAdapter {
    fn id(&self) -> &str {
        "tavily"
    }

    fn name(&self) -> &str {
        "Tavily"
    }

    fn supported_categories(&self) -> &HashSet<QueryCategory> {
        &self.categories
    }

    fn relevance_score(&self, _query: &str, category: QueryCategory) -> f64 {
        match category {
            QueryCategory::Academic => 0.85,
            QueryCategory::General => 0.75,
            QueryCategory::Qa => 0.65,
            _ => 0.0,
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

        let payload = serde_json::json!({
            "api_key": self.api_key,
            "query": params.q,
            "max_results": params.max_results,
        });

        let response = self
            .client
            .post(BASE_URL)
            .json(&payload)
            .send()
            .await
            .map_err(|error| SearchError::Network(error.to_string()))?;

        if !response.status().is_success() {
            return Err(map_http_status(response.status(), None, self.name()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| SearchError::Network(format!("invalid Tavily response body: {error}")))?;

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
    fn supports_academic_and_general() {
        let adapter = TavilyAdapter::new("key", Arc::new(Cache::new()));
        assert!(adapter.supported_categories().contains(&QueryCategory::Academic));
        assert!(!adapter.supported_categories().contains(&QueryCategory::Programming));
    }

    #[test]
    fn parses_scored_results() {
        let body = serde_json::json!({
            "results": [{"title": "T", "url": "https://ex.com", "content": "C", "score": 0.42}]
        });
        let results = TavilyAdapter::parse_results(&body);
        assert_eq!(results[0].relevance_score, Some(0.42));
    }

    #[test]
    fn skips_entries_with_malformed_url() {
        let body = serde_json::json!({"results": [{"title": "T", "url": "not a url", "content": "C"}]});
        assert!(TavilyAdapter::parse_results(&body).is_empty());
    }
}
