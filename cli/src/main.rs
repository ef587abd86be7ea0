//! Lot Pager CLI
//!
//! Pages through the seeded demo catalog with the same engine and URL
//! wrapper the app uses, and prints page windows and query strings.
//!
//! ```sh
//! # First page with the default config (~/.config/lot-pagination/config.toml)
//! lot-pager list
//!
//! # Tools only, 10 per page, walk two pages forward under the "tools" prefix
//! lot-pager list --category tools --page-size 10 --walk 2 --prefix tools
//!
//! # Page-number window for page 5 of 20
//! lot-pager pages 5 20
//!
//! # Query keys for page 3, size 50
//! lot-pager url 3 50 --prefix rev
//!
//! # Validate config and exit
//! lot-pager --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use lot_pagination::config::AppConfig;
use lot_pagination::domain::models::{Category, Item};
use lot_pagination::domain::pagination::{
    generate_page_numbers, generate_url_pagination_params, page_key, page_size_key, QueryMap,
    QueryValue,
};
use lot_pagination::domain::ports::LocationChange;
use lot_pagination::infrastructure::{
    CatalogFetcher, CatalogQuery, FailureMode, FlakyFetcher, InMemoryCatalog, MemoryLocation,
};
use lot_pagination::{bind_engine, create_event_bus, init_tracing, PaginationEngine, UrlPagination};

/// Library of Things pagination demo.
#[derive(Parser, Debug)]
#[command(
    name = "lot-pager",
    version,
    about = "Page through the Library of Things demo catalog",
    long_about = "Drives the pagination engine and URL-synchronized wrapper against an \
                  in-memory catalog.\n\n\
                  Default config: ~/.config/lot-pagination/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "LOT_PAGER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load catalog pages through the engine (default).
    List(ListArgs),
    /// Print the page-number window for a position.
    Pages {
        current: u32,
        total: u32,
        #[arg(long)]
        max_visible: Option<u32>,
    },
    /// Print the query keys written for a page and size.
    Url {
        page: u32,
        page_size: u32,
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,

    /// Case-insensitive match on item name or owner.
    #[arg(long)]
    search: Option<String>,

    /// Query-key prefix, overrides `[url].prefix`.
    #[arg(long)]
    prefix: Option<String>,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    page_size: Option<u32>,

    /// Pages to advance after the first one.
    #[arg(long, default_value_t = 0)]
    walk: u32,

    /// Injected failure probability (0.0-1.0), overrides `[catalog].failure_rate`.
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Print loading/error events as JSON lines.
    #[arg(long)]
    events: bool,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        format!("unknown category `{raw}`, expected one of: {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(lot_pagination::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) if cli.check => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
        Some(e) => {
            warn!("Failed to load config from {}: {}", config_path.display(), e);
            warn!("Using default configuration.");
        }
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   Page sizes    : {:?}", config.pagination.allowed_page_sizes);
        println!("   Default size  : {}", config.pagination.default_page_size);
        println!(
            "   Retry         : {} retries, {}ms base delay",
            config.retry.max_retries, config.retry.base_delay_ms
        );
        println!("   URL prefix    : {}", config.url.prefix.as_deref().unwrap_or("(none)"));
        println!("   Log level     : {}", config.logging.level);
        return Ok(());
    }

    match cli.command.unwrap_or(Command::List(ListArgs::default())) {
        Command::List(args) => run_list(&config, args).await,
        Command::Pages {
            current,
            total,
            max_visible,
        } => {
            let max_visible = max_visible.unwrap_or(config.pagination.max_visible_pages);
            let pages = generate_page_numbers(current, total, max_visible);
            println!("{}", format_window(&pages, current));
        }
        Command::Url {
            page,
            page_size,
            prefix,
        } => {
            let params = generate_url_pagination_params(page, page_size, prefix.as_deref());
            if params.is_empty() {
                println!("(defaults, no query keys)");
            } else {
                let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                println!("?{}", pairs.join("&"));
            }
        }
    }

    Ok(())
}

async fn run_list(config: &AppConfig, args: ListArgs) {
    let catalog = Arc::new(InMemoryCatalog::seeded(config.catalog.seed_items));
    let rate = args.failure_rate.unwrap_or(config.catalog.failure_rate);
    let mode = if rate > 0.0 {
        FailureMode::Rate(rate)
    } else {
        FailureMode::Never
    };
    let fetcher = FlakyFetcher::new(CatalogFetcher::new(catalog), mode)
        .with_latency(Duration::from_millis(config.catalog.latency_ms));

    // ── Starting location ──────────────────────────────────────
    let mut url_options = config.url_options();
    if args.prefix.is_some() {
        url_options.prefix = args.prefix.clone();
    }
    let url_wait = url_options.debounce;
    let prefix = url_options.prefix.clone();
    let start_query: QueryMap = QueryMap::from([
        (
            page_key(prefix.as_deref()),
            QueryValue::from(args.page.unwrap_or(1).to_string()),
        ),
        (
            page_size_key(prefix.as_deref()),
            QueryValue::from(
                args.page_size
                    .unwrap_or(config.pagination.default_page_size)
                    .to_string(),
            ),
        ),
    ]);
    let location = Arc::new(MemoryLocation::with_query("/items", start_query));
    let url = UrlPagination::new(location.clone(), url_options);

    // ── Status events ──────────────────────────────────────────
    let bus = create_event_bus();
    if args.events {
        let mut subscriber = bus.subscribe();
        tokio::spawn(async move {
            while let Some(message) = subscriber.recv().await {
                match message.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!("Failed to encode event: {}", e),
                }
            }
        });
    }

    // ── Engine bound to the URL ────────────────────────────────
    let mut options = config.engine_options("items");
    options.initial_page = url.current_page();
    options.initial_page_size = url.page_size();
    options.status_sink = Some(Arc::new(bus.sink_for("items")));

    let query = CatalogQuery {
        category: args.category,
        search: args.search,
    };
    let engine = Arc::new(PaginationEngine::new(fetcher, query, options));
    let binding = bind_engine(&url, &engine);
    let max_visible = config.pagination.max_visible_pages;

    engine.settled().await;
    tokio::time::sleep(url_wait).await;
    print_page(&engine, &location.current(), max_visible);

    for _ in 0..args.walk {
        if engine.error().is_some() || !engine.has_next_page() {
            break;
        }
        engine.next_page();
        engine.settled().await;
        tokio::time::sleep(url_wait).await;
        print_page(&engine, &location.current(), max_visible);
    }

    binding.abort();
}

fn print_page(
    engine: &PaginationEngine<Item, CatalogQuery>,
    location: &LocationChange,
    max_visible: u32,
) {
    if let Some(error) = engine.error() {
        println!("error: {error} (after {} attempts)", engine.attempts());
        return;
    }

    let range = engine.item_range();
    println!(
        "Page {} of {}, showing {}-{} of {}",
        engine.current_page(),
        engine.total_pages(),
        range.start,
        range.end,
        engine.total_items()
    );
    println!(
        "  {}",
        format_window(&engine.page_numbers(max_visible), engine.current_page())
    );
    for item in engine.items() {
        let status = if item.available { "available" } else { "on loan" };
        println!(
            "  {:<24} {:<12} {:<8} {}",
            item.name,
            item.category.as_str(),
            item.owner,
            status
        );
    }
    println!("  url: {}", format_location(location));
    println!();
}

fn format_window(pages: &[u32], current: u32) -> String {
    pages
        .iter()
        .map(|page| {
            if *page == current {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_location(location: &LocationChange) -> String {
    let pairs: Vec<String> = location
        .query
        .iter()
        .flat_map(|(key, value)| match value {
            QueryValue::Single(v) => vec![format!("{key}={v}")],
            QueryValue::Multi(values) => values.iter().map(|v| format!("{key}={v}")).collect(),
        })
        .collect();

    if pairs.is_empty() {
        location.path.clone()
    } else {
        format!("{}?{}", location.path, pairs.join("&"))
    }
}
