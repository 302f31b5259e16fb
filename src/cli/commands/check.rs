//! Implementation of the `dmaic check` command.

use anyhow::Result;
use clap::Args;
use console::style;

use crate::cli::context::Workspace;
use crate::cli::output::{output, supports_color, CommandOutput};
use crate::services::{check_convergence, GateVerdict};

#[derive(Args, Debug)]
pub struct CheckArgs {}

#[derive(Debug, serde::Serialize)]
pub struct CheckOutput {
    pub passed: bool,
    #[serde(flatten)]
    pub verdict: GateVerdict,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let colored = supports_color();
        let label = |text: &str, ok: bool| {
            if !colored {
                text.to_string()
            } else if ok {
                style(text).green().bold().to_string()
            } else {
                style(text).red().bold().to_string()
            }
        };

        match &self.verdict {
            GateVerdict::Converged { iteration, score } => format!(
                "{} iteration {iteration} scored {score:.2}",
                label("CONVERGED", true)
            ),
            GateVerdict::NotConverged {
                iteration,
                score,
                threshold,
                gap,
            } => format!(
                "{} iteration {iteration} scored {score:.2}, needs {threshold:.2} ({gap:.2} to go)",
                label("NOT CONVERGED", false)
            ),
            GateVerdict::NoHistory => format!(
                "{} no convergence history; run `dmaic analyze` first",
                label("NOT CONVERGED", false)
            ),
        }
    }
}

/// Returns whether the gate passed; the caller maps this to the exit status.
pub async fn execute(_args: CheckArgs, workspace: &Workspace, json_mode: bool) -> Result<bool> {
    let history = workspace.convergence_history();
    let verdict = check_convergence(
        history.as_ref(),
        &workspace.config.convergence_calculation.thresholds,
    );

    let passed = verdict.passed();
    output(&CheckOutput { passed, verdict }, json_mode);
    Ok(passed)
}
