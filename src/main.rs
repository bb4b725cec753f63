//! Polymarket market listing CLI and HTTP server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use polymarket_markets::api::{create_router, AppState};
use polymarket_markets::config::Config;
use polymarket_markets::error::AppError;
use polymarket_markets::export::{default_export_filename, export_json};
use polymarket_markets::market::{ClobClient, MarketInfo, MarketService};
use polymarket_markets::metrics;
use polymarket_markets::query::{
    categories, find_market, stats, validate_limit, QueryEngine, QueryOptions,
};
use polymarket_markets::render;
use polymarket_markets::utils::shutdown_signal;

/// Browse Polymarket CLOB markets.
#[derive(Parser, Debug)]
#[command(name = "polymarket-markets")]
#[command(about = "Fetch, normalize and query Polymarket CLOB market listings")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the CLOB API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List markets as a table (default).
    List {
        /// Markets per page (defaults to DEFAULT_LIMIT).
        #[arg(short, long)]
        limit: Option<i64>,

        /// Show every market on one page.
        #[arg(long)]
        all: bool,

        /// 1-based page number.
        #[arg(long, default_value = "1")]
        page: u32,

        /// Only markets in this category.
        #[arg(long)]
        category: Option<String>,

        /// Only active markets.
        #[arg(long)]
        active_only: bool,

        /// Also write the listed markets to a timestamped JSON file.
        #[arg(long)]
        export_json: bool,
    },

    /// Show one market by market or condition ID.
    Show {
        /// Market or condition ID.
        id: String,
    },

    /// Print aggregate statistics.
    Stats,

    /// Print the category distribution.
    Categories,

    /// Run the HTTP API.
    Serve {
        /// Listen port (defaults to PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("polymarket_markets=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = args.command.unwrap_or(Command::List {
        limit: None,
        all: false,
        page: 1,
        category: None,
        active_only: false,
        export_json: false,
    });

    let api_url = args.api_url;

    // Handle subcommands
    match command {
        Command::List {
            limit,
            all,
            page,
            category,
            active_only,
            export_json,
        } => {
            let mut opts = QueryOptions::new().page(page).active_only(active_only);
            if let Some(limit) = limit {
                opts = opts.limit(validate_limit(limit)?);
            }
            if all {
                opts = opts.limit(-1);
            }
            if let Some(category) = category {
                opts = opts.category(category);
            }
            cmd_list(load_config(api_url)?, opts, export_json).await
        }
        Command::Show { id } => cmd_show(load_config(api_url)?, &id).await,
        Command::Stats => cmd_stats(load_config(api_url)?).await,
        Command::Categories => cmd_categories(load_config(api_url)?).await,
        Command::Serve { port } => cmd_serve(load_config(api_url)?, port).await,
        Command::CheckConfig => cmd_check_config(api_url),
    }
}

/// Load and validate configuration, applying the CLI URL override.
fn load_config(api_url: Option<String>) -> polymarket_markets::Result<Config> {
    Config::load()
        .map_err(AppError::from)
        .and_then(|config| config.with_api_url(api_url).validated())
        .map_err(|e| {
            error!("Failed to load configuration: {}", e);
            e
        })
}

/// Fetch and normalize every market the configured upstream returns.
async fn load_markets(config: &Config) -> polymarket_markets::Result<Vec<MarketInfo>> {
    let client = ClobClient::new(config)?;
    info!("Fetching markets from {}", client.clob_url());

    let service = MarketService::new(Arc::new(client));
    let markets = service.try_load(None).await?;
    info!("Loaded {} markets", markets.len());
    Ok(markets)
}

/// List markets as a table.
async fn cmd_list(config: Config, opts: QueryOptions, export: bool) -> anyhow::Result<()> {
    let markets = load_markets(&config).await?;
    if markets.is_empty() {
        warn!("Upstream returned no markets");
        println!("No market data available.");
        return Ok(());
    }

    let engine = QueryEngine::new(config.query_config());
    let page = engine.query(&markets, &opts);

    println!("{}", render::rule());
    println!("POLYMARKET MARKETS");
    println!("{}", render::rule());
    print!("{}", render::markets_table(&page));
    println!("{}", render::rule());
    print!("{}", render::stats_summary(&stats(&page.items), &categories(&page.items)));
    println!("{}", render::rule());

    if export {
        let path = default_export_filename();
        export_json(&page.items, &path)?;
        println!("Exported {} markets to {}", page.items.len(), path);
    }

    Ok(())
}

/// Show a single market.
async fn cmd_show(config: Config, id: &str) -> anyhow::Result<()> {
    let markets = load_markets(&config).await?;
    match find_market(&markets, id) {
        Some(market) => {
            println!("{}", render::rule());
            print!("{}", render::market_detail(market));
            println!("{}", render::rule());
            Ok(())
        }
        None => Err(anyhow::anyhow!("Market not found: {}", id)),
    }
}

/// Print aggregate statistics over every fetched market.
async fn cmd_stats(config: Config) -> anyhow::Result<()> {
    let markets = load_markets(&config).await?;
    println!("{}", render::rule());
    println!("Total markets: {}", markets.len());
    print!("{}", render::stats_summary(&stats(&markets), &categories(&markets)));
    println!("{}", render::rule());
    Ok(())
}

/// Print the category distribution.
async fn cmd_categories(config: Config) -> anyhow::Result<()> {
    let markets = load_markets(&config).await?;
    let listing = categories(&markets);

    println!("{:<24}  {:<12}  {:>6}", "Category", "Name", "Count");
    for category in &listing {
        println!(
            "{:<24}  {:<12}  {:>6}",
            category.display_name, category.name, category.count
        );
    }
    println!("{} categories", listing.len());
    Ok(())
}

/// Run the HTTP API until shutdown.
async fn cmd_serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.port);
    let client = ClobClient::new(&config)?;

    let mut app_state = AppState::new(config.clone(), Arc::new(client));
    if config.metrics_enabled {
        match metrics::install_prometheus() {
            Ok(handle) => app_state = app_state.with_metrics(handle),
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!("CLOB API: {}", config.clob_api_url);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config(api_url: Option<String>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("POLYMARKET MARKETS - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };
    let config = config.with_api_url(api_url);

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  CLOB API URL: {}", config.clob_api_url);
    println!("  Request Timeout: {}s", config.request_timeout);
    println!("  Max Retries: {}", config.max_retries);
    println!("  Max Pages per Fetch: {}", config.fetch_max_pages);
    println!("  Default Limit: {}", config.default_limit);
    println!("  Port: {}", config.port);
    println!("  Allowed Origins: {}", config.allowed_origins.join(", "));
    println!("  Metrics: {}", if config.metrics_enabled { "Enabled" } else { "Disabled" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
