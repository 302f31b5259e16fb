//! Implementation of the `dmaic history` command.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::cli::context::Workspace;
use crate::cli::output::{output, supports_color, CommandOutput};
use crate::domain::models::{ConvergenceMetrics, ConvergenceTrend};
use crate::domain::ports::ConvergenceHistoryRepository;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Show only the most recent N records
    #[arg(long, short)]
    pub limit: Option<usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: ConvergenceMetrics,
    /// Score change against the preceding record.
    pub trend: Option<ConvergenceTrend>,
}

#[derive(Debug, serde::Serialize)]
pub struct HistoryOutput {
    pub entries: Vec<HistoryEntry>,
    pub total: usize,
}

impl HistoryOutput {
    pub fn from_records(records: &[ConvergenceMetrics], limit: Option<usize>) -> Self {
        let entries: Vec<HistoryEntry> = records
            .iter()
            .enumerate()
            .map(|(index, record)| HistoryEntry {
                record: record.clone(),
                trend: index.checked_sub(1).map(|previous| {
                    ConvergenceTrend::between(
                        records[previous].convergence_score,
                        record.convergence_score,
                    )
                }),
            })
            .collect();

        let skip = limit.map_or(0, |limit| entries.len().saturating_sub(limit));
        Self {
            entries: entries.into_iter().skip(skip).collect(),
            total: records.len(),
        }
    }
}

fn trend_cell(trend: Option<&ConvergenceTrend>, use_colors: bool) -> Cell {
    let Some(trend) = trend else {
        return Cell::new("-");
    };
    let cell = Cell::new(format!("{:+.2}", trend.delta));
    if !use_colors {
        return cell;
    }
    match trend.direction() {
        "improving" => cell.fg(Color::Green),
        "declining" => cell.fg(Color::Red),
        _ => cell,
    }
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No convergence history recorded yet.".to_string();
        }

        let use_colors = supports_color();
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Iter").add_attribute(Attribute::Bold),
                Cell::new("Timestamp").add_attribute(Attribute::Bold),
                Cell::new("Files").add_attribute(Attribute::Bold),
                Cell::new("Tests").add_attribute(Attribute::Bold),
                Cell::new("Metrics").add_attribute(Attribute::Bold),
                Cell::new("Knowledge").add_attribute(Attribute::Bold),
                Cell::new("Regr").add_attribute(Attribute::Bold),
                Cell::new("Score").add_attribute(Attribute::Bold),
                Cell::new("Trend").add_attribute(Attribute::Bold),
                Cell::new("Maturity").add_attribute(Attribute::Bold),
            ]);

        for entry in &self.entries {
            let record = &entry.record;
            let score = Cell::new(format!("{:.2}", record.convergence_score));
            let score = if use_colors && record.converged {
                score.fg(Color::Green)
            } else {
                score
            };

            table.add_row(vec![
                Cell::new(record.iteration),
                Cell::new(record.timestamp.format("%Y-%m-%d %H:%M:%S")),
                Cell::new(format!("{:.1}%", record.file_stability_pct)),
                Cell::new(format!("{:.1}%", record.test_stability_pct)),
                Cell::new(format!("{:.1}%", record.metric_stability_pct)),
                Cell::new(format!("{:.1}%", record.knowledge_growth_pct)),
                Cell::new(record.regression_count),
                score,
                trend_cell(entry.trend.as_ref(), use_colors),
                Cell::new(record.maturity().name()),
            ]);
        }

        format!(
            "{table}\n\nShowing {} of {} record(s)",
            self.entries.len(),
            self.total
        )
    }
}

pub async fn execute(args: HistoryArgs, workspace: &Workspace, json_mode: bool) -> Result<()> {
    let records = workspace
        .convergence_history()
        .load_all()
        .context("Failed to read convergence history")?;

    output(&HistoryOutput::from_records(&records, args.limit), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ConvergenceInputs, StabilityRatio};
    use crate::services::ConvergenceScorer;

    fn records() -> Vec<ConvergenceMetrics> {
        let scorer = ConvergenceScorer::default();
        (1..=4)
            .map(|iteration| {
                scorer.score(
                    iteration,
                    &ConvergenceInputs {
                        tests: StabilityRatio::new(iteration * 2, 10),
                        ..ConvergenceInputs::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_trend_per_entry() {
        let history = HistoryOutput::from_records(&records(), None);
        assert_eq!(history.total, 4);
        assert!(history.entries[0].trend.is_none());
        let trend = history.entries[1].trend.unwrap();
        assert!((trend.delta - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_limit_keeps_latest_and_their_trend() {
        let history = HistoryOutput::from_records(&records(), Some(2));
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[0].record.iteration, 3);
        assert!(history.entries[0].trend.is_some());
        assert_eq!(history.total, 4);
    }

    #[test]
    fn test_empty_history_message() {
        let history = HistoryOutput::from_records(&[], Some(5));
        assert_eq!(history.to_human(), "No convergence history recorded yet.");
    }
}
