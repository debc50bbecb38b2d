//! [`SearchUseCase`]: orchestrates classify → select → dispatch → merge,
//! and shapes the external request/response for the MCP tool surface.
//!
//! Transport-agnostic on purpose — no dependency on `rmcp`, `reqwest`, or
//! `clap`. `crate::mcp` is the only module that wires this to JSON-RPC.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::classifier;
use crate::dispatcher::Dispatcher;
use crate::merger;
use crate::model::{Freshness, QueryCategory, QueryParams, SearchError, SearchResponse};
use crate::registry::Registry;

/// The inbound shape of one `search` tool call, independent of its JSON-RPC
/// envelope. Mirrors the MCP input schema; `context` is
/// accepted (per the schema) but not consumed by the core pipeline — it is
/// a hint for the optional research/analysis post-processor, which is out
/// of scope here.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub context: Option<Vec<String>>,
    pub max_results: Option<u32>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub freshness: Option<Freshness>,
    /// Flattens `routing.category`: an explicit category bypasses the
    /// classifier entirely.
    pub category: Option<QueryCategory>,
}

/// The `search` tool's public operation. Validates, classifies (unless the
/// caller pinned a category), selects adapters, dispatches, and merges.
///
/// State machine (linear, no back-edges):
/// `INIT → VALIDATED → CATEGORISED → ADAPTERS_SELECTED → DISPATCHED → MERGED`
/// with an `ERROR` exit at validation, classification, adapter selection,
/// or total dispatch failure. Modelled here simply as early `?` returns —
/// there is no separate state enum to keep in sync, since every transition
/// is one statement and cancellation can truncate any of them uniformly.
pub struct SearchUseCase {
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
}

impl SearchUseCase {
    #[must_use]
    pub fn new(registry: Arc<Registry>, dispatcher: Dispatcher) -> Self {
        Self { registry, dispatcher }
    }

    /// Run one federated search end to end.
    pub async fn search(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<SearchResponse, SearchError> {
        // INIT → VALIDATED
        let params = QueryParams::new(request.query, request.max_results)?
            .with_country(request.country)?
            .with_language(request.language)?
            .with_freshness(request.freshness);

        // VALIDATED → CATEGORISED
        let category = match request.category {
            Some(category) => category,
            None => classifier::classify(&params.q),
        };

        // CATEGORISED → ADAPTERS_SELECTED
        let adapters = self.registry.select_for_category(category, &params.q);
        if adapters.is_empty() {
            return Err(SearchError::NoAdapterAvailable(format!(
                "no registered adapter supports category '{category}'"
            )));
        }

        // ADAPTERS_SELECTED → DISPATCHED
        let dispatch_start = tokio::time::Instant::now();
        let responses = self.dispatcher.fan_out(adapters, params.clone(), cancel).await?;

        // DISPATCHED → MERGED
        Ok(merger::merge(responses, params, dispatch_start))
    }
}

/// Plain-text rendering of a search outcome, shaped for the MCP `content`
/// channel (one text block). Never carries an rmcp type — [`crate::mcp`]
/// wraps this in `CallToolResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpTextResult {
    pub text: String,
    pub is_error: bool,
}

/// Render a search outcome as a numbered list of
/// `title (date) [Source: name]` / `URL: ...` / `snippet` blocks, the
/// literal string `No results found.` when empty, or the error's
/// [`SearchError::mcp_message`] with `is_error = true`.
#[must_use]
pub fn format_mcp_result(outcome: Result<SearchResponse, SearchError>) -> McpTextResult {
    let response = match outcome {
        Ok(response) => response,
        Err(error) => return McpTextResult { text: error.mcp_message(), is_error: true },
    };

    if response.results.is_empty() {
        return McpTextResult { text: "No results found.".to_string(), is_error: false };
    }

    let mut text = String::new();
    for (index, result) in response.results.iter().enumerate() {
        let date = result.published.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        if index > 0 {
            text.push('\n');
        }
        let _ = writeln!(text, "{}. {} ({}) [Source: {}]", index + 1, result.title, date, result.source);
        let _ = writeln!(text, "   URL: {}", result.url);
        let _ = write!(text, "   {}", result.snippet);
    }

    McpTextResult { text, is_error: false }
}
