use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use fedsearch_mcp::adapters::{BraveAdapter, GithubAdapter, StackExchangeAdapter, TavilyAdapter, WikipediaAdapter};
use fedsearch_mcp::cache::Cache;
use fedsearch_mcp::config::Config;
use fedsearch_mcp::dispatcher::{DispatchConfig, Dispatcher};
use fedsearch_mcp::mcp;
use fedsearch_mcp::pipeline::{format_mcp_result, SearchRequest, SearchUseCase};
use fedsearch_mcp::registry::Registry;

#[derive(Parser)]
#[command(
    name = "fedsearch-mcp",
    version,
    about = "Federated web-search aggregator exposed as an MCP tool over JSON-RPC stdio"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio. This is
    /// the only transport this binary implements — the HTTP REST surface
    /// named in `PORT` is out of scope and never listens.
    #[arg(long, exclusive = true)]
    mcp: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one federated search locally and print the MCP-shaped result.
    /// For manual testing outside of an MCP client.
    Search {
        query: String,
        #[arg(long)]
        max_results: Option<u32>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
}

fn build_registry(config: &Config, cache: Arc<Cache>) -> Registry {
    let registry = Registry::new();
    registry.register(Arc::new(BraveAdapter::new(config.brave_api_key.clone(), Arc::clone(&cache))));
    registry.register(Arc::new(WikipediaAdapter::new(Arc::clone(&cache))));
    if let Some(key) = &config.tavily_api_key {
        registry.register(Arc::new(TavilyAdapter::new(key.clone(), Arc::clone(&cache))));
    }
    if let Some(token) = &config.github_api_token {
        registry.register(Arc::new(GithubAdapter::new(token.clone(), Arc::clone(&cache))));
    }
    if let Some(key) = &config.stackexchange_api_key {
        registry.register(Arc::new(StackExchangeAdapter::new(key.clone(), cache)));
    }
    registry
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env().unwrap_or_else(|error| {
        eprintln!("startup failed: {error}");
        std::process::exit(1);
    });
    init_tracing(&config.log_level);
    tracing::info!(%config, "loaded configuration");

    let cache = Arc::new(Cache::new());
    let registry = Arc::new(build_registry(&config, cache));
    let dispatcher = Dispatcher::new(DispatchConfig::default());
    let use_case = Arc::new(SearchUseCase::new(registry, dispatcher));

    let runtime = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    if cli.mcp {
        runtime.block_on(async {
            if let Err(error) = mcp::serve_stdio(use_case).await {
                eprintln!("MCP server error: {error}");
                std::process::exit(1);
            }
        });
        return;
    }

    let command = cli.command.unwrap_or_else(|| {
        eprintln!("No subcommand provided. Run `fedsearch-mcp --help` for usage.");
        std::process::exit(1);
    });

    match command {
        Commands::Search { query, max_results, country, language } => {
            runtime.block_on(async {
                let request = SearchRequest { query, max_results, country, language, ..Default::default() };
                let outcome = use_case.search(request, CancellationToken::new()).await;
                let rendered = format_mcp_result(outcome);
                println!("{}", rendered.text);
                if rendered.is_error {
                    std::process::exit(1);
                }
            });
        }
    }
}
