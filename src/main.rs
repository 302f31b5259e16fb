//! dmaic CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use dmaic::cli::commands::{analyze, changes, check, history, init, scan, watch};
use dmaic::cli::{handle_error, Cli, Commands, Workspace};
use dmaic::infrastructure::config::{ConfigLoader, DEFAULT_CONFIG_PATH};
use dmaic::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (workspace, fallbacks) = match workspace(&cli) {
        Ok(loaded) => loaded,
        Err(err) => return handle_error(&err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&workspace.config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };
    for fallback in &fallbacks {
        warn!(error = %fallback, "invalid configuration, using defaults");
    }

    let result = match cli.command {
        Commands::Init(args) => init::execute(args, &workspace, cli.json).await,
        Commands::Scan(args) => scan::execute(args, &workspace, cli.json).await,
        Commands::Analyze(args) => analyze::execute(args, &workspace, cli.json).await,
        Commands::History(args) => history::execute(args, &workspace, cli.json).await,
        Commands::Check(args) => match check::execute(args, &workspace, cli.json).await {
            Ok(true) => Ok(()),
            Ok(false) => return ExitCode::FAILURE,
            Err(err) => Err(err),
        },
        Commands::Watch(args) => watch::execute(args, &workspace, cli.json).await,
        Commands::Changes(args) => changes::execute(args, &workspace, cli.json).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => handle_error(&err, cli.json),
    }
}

/// Resolve the project root and load configuration leniently.
fn workspace(cli: &Cli) -> anyhow::Result<(Workspace, Vec<dmaic::ConfigError>)> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join(PathBuf::from(DEFAULT_CONFIG_PATH)));

    let (config, fallbacks) = ConfigLoader::load_or_default(Some(&config_path));
    Ok((Workspace::new(root, config, config_path), fallbacks))
}
