//! Command-line interface for the `dmaic` binary.

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

pub use context::Workspace;

#[derive(Parser, Debug)]
#[command(name = "dmaic", version, about = "Track convergence of an iterative improvement pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (default: <root>/.dmaic/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root to scan and watch (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default configuration and create the state directory
    Init(commands::init::InitArgs),
    /// Hash tracked files and report stability against the baseline run
    Scan(commands::scan::ScanArgs),
    /// Run one full convergence iteration and record its score
    Analyze(commands::analyze::AnalyzeArgs),
    /// Show recorded convergence history with per-run trend
    History(commands::history::HistoryArgs),
    /// Exit non-zero unless the latest recorded run converged
    Check(commands::check::CheckArgs),
    /// Run the background change detector in the foreground
    Watch(commands::watch::WatchArgs),
    /// Show the most recent background change summary
    Changes(commands::changes::ChangesArgs),
}

/// Report a command failure and produce the failing exit status.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ExitCode {
    if json_mode {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain.get(1..).unwrap_or_default(),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StabilityRatio;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "dmaic",
            "--json",
            "analyze",
            "--tests",
            "48/50",
            "--knowledge",
            "12/10",
            "--regressions",
            "2",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.tests, StabilityRatio::new(48, 50));
                assert_eq!(args.metrics, StabilityRatio::new(0, 0));
                assert_eq!(args.knowledge, StabilityRatio::new(12, 10));
                assert_eq!(args.regressions, 2);
            }
            other => panic!("Expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_ratio() {
        assert!(Cli::try_parse_from(["dmaic", "analyze", "--tests", "48"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dmaic", "history", "--limit", "5", "--root", "/tmp/p"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/p")));
        assert!(matches!(cli.command, Commands::History(ref args) if args.limit == Some(5)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["dmaic", "watch", "--interval", "0"]).is_err());
        assert!(Cli::try_parse_from(["dmaic", "scan", "--window", "0"]).is_err());
    }
}
