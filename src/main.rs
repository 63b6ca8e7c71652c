//! Picmirror main entry point
//!
//! This is the command-line interface for the Picmirror gallery mirroring tool.

use clap::Parser;
use picmirror::config::{load_config_with_hash, validate, Config};
use picmirror::output::print_summary;
use picmirror::{diagnostics, ConfigError, Mirror};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Picmirror: mirrors public photo galleries to local storage
///
/// Picmirror walks a user's gallery listing, follows every link between
/// galleries, and saves each gallery's and picture's metadata plus every
/// picture exactly once. Re-running skips files that are already complete.
#[derive(Parser, Debug)]
#[command(name = "picmirror")]
#[command(version)]
#[command(about = "Mirrors public photo galleries to local storage", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the gallery site, e.g. http://www.picpix.com/username (no trailing slash)
    #[arg(long, value_name = "URL")]
    base: Option<String>,

    /// Destination backup root
    #[arg(long, value_name = "PATH")]
    dest: Option<PathBuf>,

    /// Max concurrent requests
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Continue on errors
    #[arg(long)]
    sloppy: bool,

    /// Listen address for the status server; disabled when not given
    #[arg(long, value_name = "ADDR")]
    profile: Option<SocketAddr>,

    /// Milliseconds between checks for outstanding work
    #[arg(long, value_name = "MS")]
    poll_interval: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be mirrored without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_mirror(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("picmirror=info,warn"),
            1 => EnvFilter::new("picmirror=debug,info"),
            2 => EnvFilter::new("picmirror=trace,debug"),
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

/// Loads the config file if one was given, then applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            let base = cli.base.clone().ok_or(ConfigError::Missing("--base"))?;
            let dest = cli.dest.clone().ok_or(ConfigError::Missing("--dest"))?;
            Config::new(base, dest)
        }
    };

    if let Some(base) = &cli.base {
        config.mirror.base_url = base.clone();
    }
    if let Some(dest) = &cli.dest {
        config.mirror.dest = dest.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.mirror.max_network_ops = concurrency;
    }
    if cli.sloppy {
        config.mirror.continue_on_error = true;
    }
    if let Some(addr) = cli.profile {
        config.diagnostics.listen = Some(addr);
    }
    if let Some(interval) = cli.poll_interval {
        config.mirror.drain_poll_interval = interval;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Picmirror Dry Run ===\n");

    println!("Mirror Configuration:");
    println!("  Base URL: {}", config.mirror.base_url);
    println!("  Destination: {}", config.mirror.dest.display());
    println!("  Max network operations: {}", config.mirror.max_network_ops);
    println!("  Max local operations: {}", config.mirror.max_local_ops);
    println!(
        "  On error: {}",
        if config.mirror.continue_on_error {
            "record and continue"
        } else {
            "stop"
        }
    );
    println!("  Drain poll interval: {}ms", config.mirror.drain_poll_interval);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    match config.diagnostics.listen {
        Some(addr) => println!("\nStatus server: http://{}/status", addr),
        None => println!("\nStatus server: disabled"),
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start from {}",
        picmirror::url::Endpoints::new(&config.mirror.base_url).listing_page(1)
    );
}

/// Handles the main mirror operation
async fn handle_mirror(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.mirror.continue_on_error {
        tracing::info!("Continuing past errors (sloppy mode)");
    }

    let mirror = Mirror::new(&config)?;

    if let Some(addr) = config.diagnostics.listen {
        diagnostics::spawn(addr, mirror.clone());
    }

    match mirror.run().await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Mirror failed: {}", e);
            Err(e.into())
        }
    }
}
