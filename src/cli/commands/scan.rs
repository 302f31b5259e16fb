//! Implementation of the `dmaic scan` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::context::Workspace;
use crate::cli::output::{create_spinner, output, pct, CommandOutput};
use crate::services::ScanOutcome;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Compare against the snapshot this many runs back (1 compares a run with itself)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub window: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct ScanOutput {
    #[serde(flatten)]
    pub outcome: ScanOutcome,
    pub stability_pct: f64,
}

impl CommandOutput for ScanOutput {
    fn to_human(&self) -> String {
        let baseline = self.outcome.baseline_iteration.map_or_else(
            || "none yet".to_string(),
            |iteration| format!("iteration {iteration}"),
        );
        let mut lines = vec![
            format!("Scan iteration {}", self.outcome.iteration),
            format!("  Baseline:  {baseline}"),
            format!("  Files:     {}", self.outcome.total_files),
            format!("  Stable:    {}", self.outcome.stable_files),
            format!("  Stability: {}", pct(self.stability_pct)),
        ];
        if self.outcome.errored_files > 0 {
            lines.push(format!("  Unreadable: {}", self.outcome.errored_files));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ScanArgs, workspace: &Workspace, json_mode: bool) -> Result<()> {
    let mut workspace = workspace.clone();
    if let Some(window) = args.window {
        workspace.config.scanner.baseline_window = usize::try_from(window).unwrap_or(usize::MAX);
    }

    let spinner = create_spinner("Hashing tracked files...", json_mode);
    let outcome = tokio::task::spawn_blocking(move || {
        let scanner = workspace.scanner();
        scanner.scan(&workspace.root)
    })
    .await
    .context("Scan task failed")?;
    spinner.finish_and_clear();

    output(
        &ScanOutput {
            stability_pct: outcome.stability_pct(),
            outcome,
        },
        json_mode,
    );
    Ok(())
}
