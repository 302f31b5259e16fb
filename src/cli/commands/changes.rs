//! Implementation of the `dmaic changes` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::context::Workspace;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{ChangeEntry, ChangeSummary};
use crate::domain::ports::ChangeStateRepository;

const MAX_LISTED: usize = 50;

#[derive(Args, Debug)]
pub struct ChangesArgs {
    /// List individual changed paths
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ChangesOutput {
    pub summary: ChangeSummary,
    pub changes: Vec<ChangeEntry>,
    #[serde(skip)]
    pub verbose: bool,
}

impl CommandOutput for ChangesOutput {
    fn to_human(&self) -> String {
        let Some(at) = self.summary.last_changed_at else {
            return "No background changes recorded.".to_string();
        };

        let mut lines = vec![
            format!(
                "{} change(s) recorded at {}",
                self.summary.total,
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            format!("  Added:    {}", self.summary.added),
            format!("  Modified: {}", self.summary.modified),
            format!("  Deleted:  {}", self.summary.deleted),
        ];

        if self.verbose {
            lines.push(String::new());
            for change in self.changes.iter().take(MAX_LISTED) {
                lines.push(format!("  {:<9} {}", change.change_type.to_string(), truncate(&change.path, 70)));
            }
            if self.changes.len() > MAX_LISTED {
                lines.push(format!("  ... and {} more", self.changes.len() - MAX_LISTED));
            }
        }

        lines.join("\n")
    }
}

pub async fn execute(args: ChangesArgs, workspace: &Workspace, json_mode: bool) -> Result<()> {
    let record = workspace
        .change_state()
        .load_changes()
        .context("Failed to read background changes")?;

    let (summary, changes) = record.map_or_else(
        || (ChangeSummary::default(), Vec::new()),
        |record| (record.summary(), record.changes),
    );

    output(
        &ChangesOutput {
            summary,
            changes,
            verbose: args.verbose,
        },
        json_mode,
    );
    Ok(())
}
