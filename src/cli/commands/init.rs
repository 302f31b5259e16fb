//! Implementation of the `dmaic init` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::context::Workspace;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub config_written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        lines.push(format!("  State directory: {}", self.state_dir.display()));
        if self.config_written {
            lines.push(format!("  Wrote default configuration to {}", self.config_path.display()));
        } else {
            lines.push(format!(
                "  Kept existing configuration at {} (use --force to overwrite)",
                self.config_path.display()
            ));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, workspace: &Workspace, json_mode: bool) -> Result<()> {
    let state_dir = workspace.state_dir();
    tokio::fs::create_dir_all(&state_dir)
        .await
        .with_context(|| format!("Failed to create state directory {}", state_dir.display()))?;

    let config_written = ConfigLoader::write_default(&workspace.config_path, args.force)?;

    let message = if config_written {
        "Initialized convergence tracking.".to_string()
    } else {
        "Convergence tracking already initialized.".to_string()
    };

    output(
        &InitOutput {
            success: true,
            message,
            state_dir,
            config_path: workspace.config_path.clone(),
            config_written,
        },
        json_mode,
    );
    Ok(())
}
