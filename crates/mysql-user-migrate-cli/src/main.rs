//! mysql-user-migrate CLI - copy MySQL users and grants to one or more servers.

use clap::{Parser, Subcommand};
use mysql_user_migrate::error::{EXIT_CONNECTION_ERROR, EXIT_PARTIAL_FAILURE};
use mysql_user_migrate::{Config, ConfigOverrides, MigrateError, Orchestrator, TargetConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "mysql-user-migrate")]
#[command(about = "Copy MySQL user accounts and grants from a source server to target servers")]
#[command(version)]
struct Cli {
    /// Path to YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate users and grants to every target
    Run(RunArgs),

    /// Test source and target connections
    HealthCheck,
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// Source DSN (default: $SOURCE_DSN)
    #[arg(long)]
    source: Option<String>,

    /// Target DSN, optionally `name=dsn` (repeatable; default: $TARGET_DSN or $TARGET_DSN_LIST)
    #[arg(long = "target")]
    targets: Vec<String>,

    /// User or user@host patterns to include (repeatable, comma-separated)
    #[arg(long)]
    include: Vec<String>,

    /// User or user@host patterns to exclude (repeatable, comma-separated)
    #[arg(long)]
    exclude: Vec<String>,

    /// Write the JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Plan only; do not modify targets (`--dry-run=false` overrides the config file)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    dry_run: Option<bool>,

    /// Drop existing target accounts before recreating them
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    drop_missing: Option<bool>,

    /// Force drop/recreate of existing target accounts
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    force_overwrite: Option<bool>,

    /// Number of targets migrated in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Connect timeout per server in seconds
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Log progress at info level
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    verbose: Option<bool>,
}

impl RunArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source: self.source.clone(),
            targets: self
                .targets
                .iter()
                .enumerate()
                .map(|(i, raw)| TargetConfig::parse_cli(raw, i + 1))
                .collect(),
            include: split_patterns(&self.include),
            exclude: split_patterns(&self.exclude),
            dry_run: self.dry_run,
            drop_missing: self.drop_missing,
            force_overwrite: self.force_overwrite,
            report_path: self.report.clone(),
            concurrency: self.concurrency,
            verbose: self.verbose,
            connect_timeout_secs: self.connect_timeout,
        }
    }
}

/// Flatten repeated flag values, each of which may hold a comma-separated list.
fn split_patterns(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    let overrides = match &cli.command {
        Commands::Run(args) => args.overrides(),
        Commands::HealthCheck => ConfigOverrides::default(),
    };

    let file_config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut config = file_config.merge(overrides);
    config.apply_env_defaults(|key| std::env::var(key).ok());
    config.validate()?;

    setup_logging(&cli.verbosity, &cli.log_format, config.verbose);
    if let Some(ref path) = cli.config {
        info!("Loaded configuration from {:?}", path);
    }

    match cli.command {
        Commands::Run(_) => {
            let cancel_token = setup_signal_handler();
            let report_path = config.report_path.clone();
            let orchestrator = Orchestrator::new(config);
            let report = orchestrator.run(cancel_token.clone()).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report);
            }

            if let Some(path) = report_path {
                match report.write_json(&path) {
                    Ok(()) => info!("Report written to {:?}", path),
                    Err(e) => warn!("Failed to write report to {:?}: {}", path, e),
                }
            }

            if cancel_token.is_cancelled() {
                return Ok(ExitCode::from(MigrateError::Cancelled.exit_code()));
            }
            if report.has_failures() {
                return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config);
            let result = orchestrator.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                for endpoint in &result.endpoints {
                    println!(
                        "  {}: {} ({}ms)",
                        endpoint.name,
                        if endpoint.connected { "OK" } else { "FAILED" },
                        endpoint.latency_ms
                    );
                    if let Some(ref err) = endpoint.error {
                        println!("    Error: {}", err);
                    }
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Ok(ExitCode::from(EXIT_CONNECTION_ERROR));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn setup_logging(verbosity: &str, format: &str, verbose: bool) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        "warn" if verbose => Level::INFO,
        _ => Level::WARN,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, label) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    stream.recv().await;
                    eprintln!("\nReceived {}. Cancelling migration...", label);
                    token.cancel();
                });
            }
            Err(e) => warn!("Failed to install {} handler: {}", label, e),
        }
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Cancelling migration...");
            token.cancel();
        }
    });

    cancel_token
}
