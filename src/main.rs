//! Listing-Sweep main entry point
//!
//! This is the command-line interface for the Listing-Sweep product listing crawler.

use clap::Parser;
use listing_sweep::config::{load_config_with_hash, Config};
use listing_sweep::crawler::run_crawl;
use listing_sweep::url::PageRequest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Listing-Sweep: a resilient product listing crawler
///
/// Listing-Sweep walks the pages of a product listing, extracts product
/// records from each card, and stores a bounded, deduplicated result set.
#[derive(Parser, Debug)]
#[command(name = "listing-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A resilient product listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show which pages would be fetched without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_sweep=info,warn"),
            1 => EnvFilter::new("listing_sweep=debug,info"),
            2 => EnvFilter::new("listing_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and lists the page URLs
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Site origin: {}", config.crawler.site_origin);
    println!("  Results wanted: {}", config.crawler.results_wanted);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!("  Max runtime: {}s", config.crawler.max_runtime_secs);

    println!("\nProxies ({}):", config.proxy.urls.len());
    for proxy in &config.proxy.urls {
        println!("  - {}", proxy);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    if let Some(records_path) = &config.output.records_path {
        println!("  Records: {}", records_path);
    }

    println!("\nPages:");
    for page in 1..=config.crawler.max_pages {
        println!(
            "  {}. {}",
            page,
            PageRequest::new(&config.crawler.start_url, page).url()
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use listing_sweep::output::{load_statistics, print_statistics};
    use listing_sweep::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main sweep operation
async fn handle_crawl(config: Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Sweeping up to {} pages for {} products",
        config.crawler.max_pages,
        config.crawler.results_wanted
    );

    match run_crawl(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Sweep completed successfully: {} products from {} pages",
                summary.products_extracted,
                summary.pages_processed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}
