//! Stack Exchange (Stack Overflow site) Q&A search adapter. Requires
//! `STACKEXCHANGE_API_KEY`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::url_encode;
use crate::adapter::{map_http_status, AdapterContract};
use crate::cache::{cache_key, Cache, CacheLookup};
use crate::model::{QueryCategory, QueryParams, SearchError, SearchResponse, SearchResult};

const BASE_URL: &str = "https://api.stackexchange.com/2.3/search/advanced";

pub struct StackExchangeAdapter {
    client: reqwest::Client,
    api_key: String,
    cache: Arc<Cache>,
    categories: HashSet<QueryCategory>,
}

impl StackExchangeAdapter {
    #[must_use]
    pub fn new(api_key: impl Into<String>, cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            cache,
            categories: [QueryCategory::Programming, QueryCategory::Technical, QueryCategory::Qa]
                .into_iter()
                .collect(),
        }
    }

    fn parse_results(body: &Value) -> Vec<SearchResult> {
        body["items"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, entry)| {
                let url = entry["link"].as_str()?.to_string();
                Some(SearchResult {
                    id: format!("stackexchange:{url}"),
                    title: entry["title"].as_str().unwrap_or_default().to_string(),
                    url,
                    snippet: String::new(),
                    published: entry["creation_date"]
                        .as_i64()
                        .and_then(|epoch| chrono::DateTime::from_timestamp(epoch, 0)),
                    rank: Some(index as u32 + 1),
                    source: "stackexchange".to_string(),
                    source_type: Some("qa".to_string()),
                    relevance_score: entry["score"].as_f64().map(|score| (score / 100.0).clamp(0.0, 1.0)),
                })
            })
            .filter(SearchResult::has_valid_url)
            .collect()
    }
}

#[async_trait]
impl AdapterContract for StackExchangeAdapter {
    fn id(&self) -> &str {
        "stackexchange"
    }

    fn name(&self) -> &str {
        "Stack Exchange"
    }

    fn supported_categories(&self) -> &HashSet<QueryCategory> {
        &self.categories
    }

    fn relevance_score(&self, _query: &str, category: QueryCategory) -> f64 {
        match category {
            QueryCategory::Qa => 0.9,
            QueryCategory::Programming => 0.8,
            QueryCategory::Technical => 0.4,
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
            "{BASE_URL}?order=desc&sort=relevance&q={}&site=stackoverflow&pagesize={}&key={}",
            url_encode(&params.q),
            params.max_results,
            self.api_key,
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| SearchError::Network(error.to_string()))?;

        if !response.status().is_success() {
            return Err(map_http_status(response.status(), None, self.name()));
        }

        let body: Value = response.json().await.map_err(|error| {
            SearchError::Network(format!("invalid Stack Exchange response body: {error}"))
        })?;

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
