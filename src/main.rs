use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use redraft::cli::Cli;
use redraft::config::{self, Credentials, GlobalConfig};
use redraft::llm::gateway;
use redraft::loops::{CommandRunner, CorrectionLoop, RunnerConfig, Workspace};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redraft")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("redraft.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &GlobalConfig) -> Result<()> {
    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let credentials = Credentials::from_env();
    let client = gateway::build_client(&credentials, &config.llm)
        .context("No usable model backend")?;
    info!("Using model backend: {}", client.model());

    let workdir = cli
        .workdir
        .clone()
        .unwrap_or_else(|| config.workspace.dir.clone());
    let workspace = Workspace::new(
        workdir,
        config.workspace.code_file.clone(),
        config.workspace.test_file.clone(),
    );

    let runner = CommandRunner::new(
        RunnerConfig::new(&config.runner.command)
            .with_timeout(Duration::from_millis(config.runner.timeout_ms)),
    );

    let max_rounds = cli.max_rounds.unwrap_or(config.max_rounds);
    let looper = CorrectionLoop::new(client.clone(), Box::new(runner), workspace, max_rounds);

    let spec = cli.spec();
    println!("{} {}", "Spec:".cyan(), spec);

    let code = looper
        .run(spec)
        .await
        .context("Self-correction loop failed")?;

    let usage = client.total_usage();
    info!(
        "Run complete, token usage: input={} output={}",
        usage.input_tokens, usage.output_tokens
    );

    println!();
    println!("{}", "ALL TESTS PASS. Final code below.".green().bold());
    println!();
    println!("{}", code);

    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Seed the environment from a local env file before any threads
    // exist; already-set variables win.
    config::load_env_file(Path::new(".env"));

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = GlobalConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run_application(&cli, &config))
}
