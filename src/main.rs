//! Baku-Dine main entry point
//!
//! This is the command-line interface for the BakuGuide restaurant scraper.

use anyhow::Context;
use baku_dine::config::{resolve_config, Config, Overrides};
use baku_dine::crawler::crawl_to_csv;
use baku_dine::output::{
    compute_insights, print_insights, print_run_summary, read_table, write_insights_json,
};
use baku_dine::ScrapeError;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Baku-Dine: a BakuGuide restaurant scraper
///
/// Fetches the paginated restaurant listings, visits every restaurant's
/// detail page and writes one merged CSV row per restaurant.
#[derive(Parser, Debug)]
#[command(name = "baku-dine")]
#[command(version)]
#[command(about = "Scrapes BakuGuide restaurants into a CSV table", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of listing pages to fetch
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Maximum number of requests in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path of the CSV table to write
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Start without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with = "insights")]
    dry_run: bool,

    /// Print insights for an existing CSV table and exit
    #[arg(long, value_name = "CSV", conflicts_with = "dry_run")]
    insights: Option<PathBuf>,

    /// Also write the insights as JSON (with --insights)
    #[arg(long, value_name = "PATH", requires = "insights")]
    insights_json: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            total_pages: self.pages,
            max_concurrent_requests: self.concurrency,
            request_timeout: self.timeout,
            csv_path: self.output.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(table) = &cli.insights {
        return handle_insights(table, cli.insights_json.as_deref());
    }

    // Load and validate configuration
    let config = match resolve_config(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(ScrapeError::from(e).into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if !cli.yes && !confirm(&config)? {
        println!("Aborted.");
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("baku_dine=info,warn"),
            1 => EnvFilter::new("baku_dine=debug,info"),
            2 => EnvFilter::new("baku_dine=trace,debug"),
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

/// Asks the user to confirm a full crawl on stdin
fn confirm(config: &Config) -> io::Result<bool> {
    print!(
        "Fetch {} listing pages from {} with up to {} concurrent requests? [y/N] ",
        config.crawler.total_pages, config.site.base_url, config.crawler.max_concurrent_requests
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Handles the --dry-run mode: shows the effective config and listing URLs
fn handle_dry_run(config: &Config) {
    println!("=== Baku-Dine Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Listing pages: {}", config.crawler.total_pages);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Detail path prefix: {}", config.site.detail_path_prefix);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Output: {}", config.output.csv_path);

    println!("\nListing URLs ({}):", config.crawler.total_pages);
    for page in 1..=config.crawler.total_pages {
        println!("  - {}", config.site.listing_url(page));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --insights mode: statistics over an existing table
fn handle_insights(
    table: &Path,
    json_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_table(table)
        .with_context(|| format!("Failed to read table {}", table.display()))?;
    tracing::info!("Loaded {} rows from {}", rows.len(), table.display());

    let insights = compute_insights(&rows)?;
    print_insights(&insights);

    if let Some(path) = json_path {
        write_insights_json(&insights, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n✓ Insights saved to: {}", path.display());
    }

    Ok(())
}

/// Handles the main crawl operation
///
/// Ctrl-C stops the crawl at once and nothing is written. A failed table
/// write is reported after the crawl as an output error.
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let output_path = PathBuf::from(&config.output.csv_path);

    tracing::info!(
        "Starting crawl: {} listing pages, {} concurrent requests, {}s timeout",
        config.crawler.total_pages,
        config.crawler.max_concurrent_requests,
        config.crawler.request_timeout
    );

    let outcome = tokio::select! {
        result = crawl_to_csv(config) => match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Crawl failed: {}", e);
                return Err(e.into());
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, no output written");
            return Err(ScrapeError::Interrupted.into());
        }
    };

    print_run_summary(&outcome.report, &output_path);

    Ok(())
}
