//! GitHub code/repository search adapter. Requires `GITHUB_API_TOKEN`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{retry_after, url_encode};
use crate::adapter::{map_http_status, AdapterContract};
use crate::cache::{cache_key, Cache, CacheLookup};
use crate::model::{QueryCategory, QueryParams, SearchError, SearchResponse, SearchResult};

const BASE_URL: &str = "https://api.github.com/search/repositories";

pub struct GithubAdapter {
    client: reqwest::Client,
    api_token: String,
    cache: Arc<Cache>,
    categories: HashSet<QueryCategory>,
}

impl GithubAdapter {
    #[must_use]
    pub fn new(api_token: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: api_token.into(),
            cache,
            categories: [QueryCategory::Programming, QueryCategory::Technical].into_iter().collect(),
        }
    }

    fn parse_results(body: &Value) -> Vec<SearchResult> {
        body["items"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, entry)| {
                let url = entry["html_url"].as_str()?.to_string();
                Some(SearchResult {
                    id: format!("github:{url}"),
                    title: entry["full_name"].as_str().unwrap_or_default().to_string(),
                    url,
                    snippet: entry["description"].as_str().unwrap_or_default().to_string(),
                    published: entry["updated_at"].as_str().and_then(|s| s.parse().ok()),
                    rank: Some(index as u32 + 1),
                    source: "github".to_string(),
                    source_type: Some("repository".to_string()),
                    relevance_score: entry["stargazers_count"]
                        .as_f64()
                        .map(|stars| (stars / 100_000.0).clamp(0.0, 1.0)),
                })
            })
            .filter(SearchResult::has_valid_url)
            .collect()
    }
}

#[async_trait]
impl AdapterContract for GithubAdapter {
    fn id(&self) -> &str {
        "github"
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn supported_categories(&self) -> &HashSet<QueryCategory> {
        &self.categories
    }

    fn relevance_score(&self, _query: &str, category: QueryCategory) -> f64 {
        match category {
            QueryCategory::Programming => 0.95,
            QueryCategory::Technical => 0.5,
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

        let url = format!(
            "{BASE_URL}?q={}&per_page={}",
            url_encode(&params.q),
            params.max_results
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "fedsearch-mcp")
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
            .map_err(|error| SearchError::Network(format!("invalid GitHub response body: {error}")))?;

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
