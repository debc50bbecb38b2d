//! Wikipedia adapter. No API key required — the MediaWiki search API is
//! open. Also the one adapter declared Unicode-safe throughout; see
//! `DESIGN.md` for the Japanese-character routing Open Question this
//! replaces.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::url_encode;
use crate::adapter::{map_http_status, AdapterContract};
use crate::cache::{cache_key, Cache, CacheLookup};
use crate::model::{QueryCategory, QueryParams, SearchError, SearchResponse, SearchResult};

const BASE_URL: &str = "https://en.wikipedia.org/w/api.php";

pub struct WikipediaAdapter {
    client: reqwest::Client,
    cache: Arc<Cache>,
    categories: HashSet<QueryCategory>,
}

impl WikipediaAdapter {
    #[must_use]
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
            categories: [QueryCategory::General, QueryCategory::Academic, QueryCategory::Qa]
                .into_iter()
                .collect(),
        }
    }

    fn parse_results(body: &Value) -> Vec<SearchResult> {
        body["query"]["search"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(index, entry)| {
                let title = entry["title"].as_str()?.to_string();
                let url = format!(
                    "https://en.wikipedia.org/wiki/{}",
                    title.replace(' ', "_")
                );
                let snippet = entry["snippet"].as_str().unwrap_or_default();
                // MediaWiki wraps matched terms in <span class="searchmatch">.
                let snippet = snippet.replace("<span class=\"searchmatch\">", "").replace("</span>", "");
                Some(SearchResult {
                    id: format!("wikipedia:{url}"),
                    title,
                    url,
                    snippet,
                    published: entry["timestamp"].as_str().and_then(|s| s.parse().ok()),
                    rank: Some(index as u32 + 1),
                    source: "wikipedia".to_string(),
                    source_type: Some("encyclopedia".to_string()),
                    relevance_score: None,
                })
            })
            .filter(SearchResult::has_valid_url)
            .collect()
    }
}

#[async_trait]
impl AdapterContract for WikipediaAdapter {
    fn id(&self) -> &str {
        "wikipedia"
    }

    fn name(&self) -> &str {
        "Wikipedia"
    }

    fn supported_categories(&self) -> &HashSet<QueryCategory> {
        &self.categories
    }

    fn relevance_score(&self, _query: &str, category: QueryCategory) -> f64 {
        match category {
            QueryCategory::Academic => 0.8,
            QueryCategory::General => 0.6,
            QueryCategory::Qa => 0.55,
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
            "{BASE_URL}?action=query&list=search&format=json&srlimit={}&srsearch={}",
            params.max_results,
            url_encode(&params.q),
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

        let body: Value = response
            .json()
            .await
            .map_err(|error| SearchError::Network(format!("invalid Wikipedia response body: {error}")))?;

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
