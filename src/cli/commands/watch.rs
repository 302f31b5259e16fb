//! Implementation of the `dmaic watch` command.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::cli::context::Workspace;
use crate::cli::output::{create_spinner, output, CommandOutput};
use crate::domain::models::ChangeSummary;
use crate::services::DetectorStatus;

const SPINNER_REFRESH: Duration = Duration::from_millis(500);

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long, short)]
    pub duration: Option<u64>,

    /// Poll interval in seconds, overriding the configuration
    #[arg(long, short, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
pub struct WatchOutput {
    pub status: DetectorStatus,
    pub summary: ChangeSummary,
}

impl CommandOutput for WatchOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Change detector stopped after {} poll(s) ({} failed)",
            self.status.completed_polls, self.status.failed_polls
        )];
        if self.summary.total == 0 {
            lines.push("  No changes recorded.".to_string());
        } else {
            lines.push(format!(
                "  Last diff: {} change(s) ({} added, {} modified, {} deleted)",
                self.summary.total, self.summary.added, self.summary.modified, self.summary.deleted
            ));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: WatchArgs, workspace: &Workspace, json_mode: bool) -> Result<()> {
    let mut config = workspace.config.change_detector.clone();
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }

    let mut detector = workspace.change_detector(config);
    detector.start();

    let spinner = create_spinner("Watching for changes (Ctrl-C to stop)...", json_mode);
    let deadline = args
        .duration
        .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let until_deadline = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupt received, stopping change detector");
                break;
            }
            () = until_deadline => break,
            () = tokio::time::sleep(SPINNER_REFRESH) => {
                let status = detector.status().await;
                spinner.set_message(format!(
                    "Watching for changes: {} poll(s), {} change(s) last poll",
                    status.completed_polls, status.last_change_count
                ));
            }
        }
    }

    detector.stop().await;
    spinner.finish_and_clear();

    output(
        &WatchOutput {
            status: detector.status().await,
            summary: detector.summary(),
        },
        json_mode,
    );
    Ok(())
}
