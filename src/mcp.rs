//! MCP (Model Context Protocol) server exposing the federated search
//! pipeline as a single `search` tool over stdio JSON-RPC.
//!
//! Start with: `fedsearch-mcp --mcp`

use std::sync::Arc;

use rmcp::handler::server::tool::{ToolCallContext, ToolRouter};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::model::Freshness;
use crate::pipeline::{format_mcp_result, SearchRequest, SearchUseCase};

/// Input schema for the `search` tool. Validation beyond shape
/// — length bounds, range checks — happens downstream in
/// [`crate::model::QueryParams::new`]; this struct only captures what the
/// wire format allows the caller to omit.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// The search query, 1 to 200 characters.
    pub query: String,
    /// Optional contextual hints for a downstream analysis step. Accepted
    /// but not consumed by the core pipeline.
    pub context: Option<Vec<String>>,
    /// Maximum number of results to return, 1 to 50 (default 20).
    pub max_results: Option<u32>,
    /// Two-letter ISO-3166-1 country code.
    #[schemars(length(min = 2, max = 2))]
    pub country: Option<String>,
    /// Two to five character language code.
    #[schemars(length(min = 2, max = 5))]
    pub language: Option<String>,
    /// Recency window: `"day"`, `"week"`, or `"month"`.
    pub freshness: Option<String>,
}

fn parse_freshness(raw: &str) -> Result<Freshness, McpError> {
    match raw {
        "day" => Ok(Freshness::Day),
        "week" => Ok(Freshness::Week),
        "month" => Ok(Freshness::Month),
        other => Err(McpError::invalid_params(
            format!("freshness must be one of day|week|month, got '{other}'"),
            None,
        )),
    }
}

/// The MCP server struct. Holds the pipeline and the auto-generated tool
/// router; nothing else is process-global here — everything the pipeline
/// needs was injected at construction.
#[derive(Clone)]
pub struct FedSearchMcp {
    use_case: Arc<SearchUseCase>,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FedSearchMcp {
    #[must_use]
    pub fn new(use_case: Arc<SearchUseCase>) -> Self {
        Self { use_case, tool_router: Self::tool_router() }
    }

    #[tool(
        name = "search",
        description = "Federated web search. Classifies the query, fans out to the relevant search backends (general web, programming, academic, Q&A, ...), merges and de-duplicates their results, and returns a ranked list."
    )]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let freshness = p.freshness.as_deref().map(parse_freshness).transpose()?;

        let request = SearchRequest {
            query: p.query,
            context: p.context,
            max_results: p.max_results,
            country: p.country,
            language: p.language,
            freshness,
            category: None,
        };

        let outcome = self.use_case.search(request, CancellationToken::new()).await;
        let rendered = format_mcp_result(outcome);
        let mut result = CallToolResult::success(vec![Content::text(rendered.text)]);
        result.is_error = Some(rendered.is_error);
        Ok(result)
    }
}

impl ServerHandler for FedSearchMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Federated search engine. One tool: `search`. Pass a query and optional \
                 maxResults/country/language/freshness; results come back as a ranked, \
                 de-duplicated list drawn from whichever backends the query's category \
                 routes to."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "fedsearch-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Federated Search".into()),
                description: Some("Federated web-search aggregator".into()),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

/// Start the MCP server on stdio. Called from `main.rs` when `--mcp` is
/// passed.
pub async fn serve_stdio(use_case: Arc<SearchUseCase>) -> Result<(), Box<dyn std::error::Error>> {
    let server = FedSearchMcp::new(use_case);
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        eprintln!("MCP serve error: {e}");
    })?;
    service.waiting().await?;
    Ok(())
}
