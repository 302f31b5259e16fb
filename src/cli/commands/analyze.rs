//! Implementation of the `dmaic analyze` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::context::Workspace;
use crate::cli::output::{create_spinner, output, pct, CommandOutput};
use crate::domain::models::{AgentOutcome, StabilityRatio};
use crate::services::{IterationReport, PipelineInputs};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Stable over total tests, as S/T
    #[arg(long, default_value = "0/0")]
    pub tests: StabilityRatio,

    /// Stable over total metrics, as S/T
    #[arg(long, default_value = "0/0")]
    pub metrics: StabilityRatio,

    /// Current over baseline knowledge entries, as C/B
    #[arg(long, default_value = "0/0")]
    pub knowledge: StabilityRatio,

    /// Number of regressions detected in this run
    #[arg(long, default_value_t = 0)]
    pub regressions: u32,
}

impl From<&AnalyzeArgs> for PipelineInputs {
    fn from(args: &AnalyzeArgs) -> Self {
        Self {
            tests: args.tests,
            metrics: args.metrics,
            knowledge: args.knowledge,
            regression_count: args.regressions,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AnalyzeOutput {
    #[serde(flatten)]
    pub report: IterationReport,
    pub converged: bool,
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();

        match &self.report.scan {
            AgentOutcome::Completed(scan) => lines.push(format!(
                "Measure:  {}/{} files stable ({})",
                scan.stable_files,
                scan.total_files,
                pct(scan.stability_pct())
            )),
            AgentOutcome::Unavailable { capability, .. } => {
                lines.push(format!("Measure:  unavailable ({capability})"));
            }
        }

        match &self.report.metrics {
            AgentOutcome::Completed(record) => {
                lines.push(format!(
                    "Analyze:  iteration {} scored {:.2} ({}, level {})",
                    record.iteration,
                    record.convergence_score,
                    record.maturity().name(),
                    record.maturity_level
                ));
                lines.push(format!("  File stability:   {}", pct(record.file_stability_pct)));
                lines.push(format!("  Test stability:   {}", pct(record.test_stability_pct)));
                lines.push(format!("  Metric stability: {}", pct(record.metric_stability_pct)));
                lines.push(format!("  Knowledge growth: {}", pct(record.knowledge_growth_pct)));
                lines.push(format!("  Regressions:      {}", record.regression_count));
                if let Some(trend) = &self.report.trend {
                    lines.push(format!("  Trend:            {:+.2} ({})", trend.delta, trend.direction()));
                }
            }
            AgentOutcome::Unavailable { capability, .. } => {
                lines.push(format!("Analyze:  unavailable ({capability})"));
            }
        }

        match &self.report.changes {
            AgentOutcome::Completed(summary) => lines.push(format!(
                "Control:  {} change(s) ({} added, {} modified, {} deleted)",
                summary.total, summary.added, summary.modified, summary.deleted
            )),
            AgentOutcome::Unavailable { capability, .. } => {
                lines.push(format!("Control:  unavailable ({capability})"));
            }
        }

        if !self.report.unavailable.is_empty() {
            let phases: Vec<&str> = self
                .report
                .unavailable
                .iter()
                .map(|agent| agent.phase.as_str())
                .collect();
            lines.push(format!("Disabled: {}", phases.join(", ")));
        }

        lines.push(String::new());
        lines.push(if self.converged {
            "CONVERGED".to_string()
        } else {
            "Not converged".to_string()
        });
        lines.join("\n")
    }
}

pub async fn execute(args: AnalyzeArgs, workspace: &Workspace, json_mode: bool) -> Result<()> {
    let inputs = PipelineInputs::from(&args);
    let workspace = workspace.clone();

    let spinner = create_spinner("Running convergence iteration...", json_mode);
    let report = tokio::task::spawn_blocking(move || workspace.pipeline().run_iteration(inputs))
        .await
        .context("Convergence iteration failed")?;
    spinner.finish_and_clear();

    output(
        &AnalyzeOutput {
            converged: report.converged(),
            report,
        },
        json_mode,
    );
    Ok(())
}
