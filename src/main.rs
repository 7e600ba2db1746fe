//! LandWatch Harvest main entry point
//!
//! This is the command-line interface for the listing acquisition pipeline.

use anyhow::{bail, Context};
use clap::Parser;
use landwatch_harvest::config::{load_config_with_hash, validate_job, Config, JobDescriptor};
use landwatch_harvest::crawler::Harvester;
use landwatch_harvest::output::{build_sink, print_summary};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// LandWatch Harvest: land listings to CSV
///
/// Fetches every results page of one LandWatch search through the
/// configured proxy, extracts one record per listing and writes the
/// records as `{date}-{location}.csv` to a directory or an object store.
#[derive(Parser, Debug)]
#[command(name = "landwatch-harvest")]
#[command(version)]
#[command(about = "Harvest LandWatch listings to CSV", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// First results page of the search (overrides `[job] starting-url`)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output directory or bucket base URL (overrides `[job] destination`)
    #[arg(long, value_name = "DEST")]
    destination: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the job without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let job = resolve_job(&config, cli.url, cli.destination)?;
    validate_job(&job, config.output.kind).context("invalid job")?;

    if cli.dry_run {
        handle_dry_run(&config, &job);
        return Ok(());
    }

    handle_harvest(&config, &job).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("landwatch_harvest=info,warn"),
            1 => EnvFilter::new("landwatch_harvest=debug,info"),
            2 => EnvFilter::new("landwatch_harvest=trace,debug"),
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

/// Command-line values win over the `[job]` table
fn resolve_job(
    config: &Config,
    url: Option<String>,
    destination: Option<String>,
) -> anyhow::Result<JobDescriptor> {
    let configured = config.job.as_ref();

    let starting_url = url.or_else(|| configured.map(|j| j.starting_url.clone()));
    let destination = destination.or_else(|| configured.map(|j| j.destination.clone()));

    match (starting_url, destination) {
        (Some(starting_url), Some(destination)) => Ok(JobDescriptor {
            starting_url,
            destination,
        }),
        (None, _) => bail!("no starting URL: pass --url or set [job] starting-url"),
        (_, None) => bail!("no destination: pass --destination or set [job] destination"),
    }
}

/// Handles the --dry-run mode: shows the resolved configuration and job
fn handle_dry_run(config: &Config, job: &JobDescriptor) {
    println!("=== LandWatch Harvest Dry Run ===\n");

    println!("Fetcher Configuration:");
    println!("  Request timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max parallel requests: {}", config.fetcher.max_parallel);
    println!("  Attempts per page: {}", config.fetcher.max_attempts);
    println!("  Retry delay: {}ms", config.fetcher.retry_delay_ms);
    println!("  Batch size: {}", config.fetcher.effective_batch_size());
    match config.fetcher.run_timeout_secs {
        Some(secs) => println!("  Run timeout: {}s", secs),
        None => println!("  Run timeout: none"),
    }
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nProxy:");
    println!("  Strategy: {}", config.proxy.strategy);
    println!("  Credentials: {:?}", config.credentials);

    println!("\nJob:");
    println!("  Starting URL: {}", job.starting_url);
    println!("  Destination: {}", job.destination);
    println!("  Sink: {:?}", config.output.kind);

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, job: &JobDescriptor) -> anyhow::Result<()> {
    let upload_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetcher.timeout_secs))
        .build()
        .context("failed to build upload client")?;
    let sink = build_sink(config.output.kind, job, upload_client);

    tracing::info!(
        url = %job.starting_url,
        destination = %job.destination,
        sink = sink.name(),
        "Starting harvest"
    );

    let harvester = Harvester::from_config(config, sink)?;
    let summary = harvester
        .run(&job.starting_url)
        .await
        .with_context(|| format!("harvest of {} failed", job.starting_url))?;

    print_summary(&summary);
    Ok(())
}
