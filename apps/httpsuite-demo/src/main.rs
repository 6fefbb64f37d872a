use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use httpsuite::ProblemTypes;
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod app;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// httpsuite demo server - validated JSON endpoints with problem responses
#[derive(Parser)]
#[command(name = "httpsuite-demo")]
#[command(about = "httpsuite demo server - validated JSON endpoints with problem responses")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new("."));
    tracing::info!("httpsuite demo starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn problem_types(config: &AppConfig) -> ProblemTypes {
    ProblemTypes::from_config(
        config.problems.base_url.as_deref(),
        config
            .problems
            .error_paths
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    )
}

async fn run_server(config: AppConfig) -> Result<()> {
    let state = app::AppState {
        problems: Arc::new(problem_types(&config)),
        body_limit: config.server.body_limit_bytes,
    };
    let router = app::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind address {addr}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = async {
        if let Err(e) = shutdown::wait_for_shutdown().await {
            tracing::warn!(error = %e, "signal handler failed; shutting down");
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let problems = problem_types(&config);
    for category in config.problems.error_paths.keys() {
        tracing::debug!(category = %category, type_url = %problems.resolve(category), "problem type");
    }

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
