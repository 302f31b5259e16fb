//! One iteration of the convergence pipeline, run in-process.
//!
//! Measure (file stability) feeds Analyze (scoring), whose record is appended
//! to the convergence history; Control contributes the latest background
//! change summary. Each phase goes through its agent, so a disabled phase
//! shows up in the report as unavailable instead of failing the run.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::change_detector::summarize_changes;
use super::convergence_scorer::ConvergenceScorer;
use super::stability_scanner::{FileStabilityScanner, ScanOutcome};
use crate::domain::models::{
    Agent, AgentOutcome, AgentRoster, ChangeSummary, ConvergenceInputs, ConvergenceMetrics,
    ConvergenceTrend, DmaicPhase, StabilityRatio,
};
use crate::domain::ports::{
    ChangeStateRepository, ConvergenceHistoryRepository, HashHistoryRepository,
};

/// Signals supplied by the caller; file stability is measured by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineInputs {
    pub tests: StabilityRatio,
    pub metrics: StabilityRatio,
    pub knowledge: StabilityRatio,
    pub regression_count: u32,
}

impl Default for PipelineInputs {
    fn default() -> Self {
        Self {
            tests: StabilityRatio::new(0, 0),
            metrics: StabilityRatio::new(0, 0),
            knowledge: StabilityRatio::new(0, 0),
            regression_count: 0,
        }
    }
}

/// Typed outcome of one pipeline iteration.
#[derive(Debug, Clone, Serialize)]
pub struct IterationReport {
    pub scan: AgentOutcome<ScanOutcome>,
    pub metrics: AgentOutcome<ConvergenceMetrics>,
    /// Score change against the previous record, when both exist.
    pub trend: Option<ConvergenceTrend>,
    pub changes: AgentOutcome<ChangeSummary>,
    /// Agents that were disabled for this iteration.
    pub unavailable: Vec<Agent>,
}

impl IterationReport {
    pub fn converged(&self) -> bool {
        self.metrics.completed().is_some_and(|m| m.converged)
    }
}

pub struct ConvergencePipeline<H, C, S>
where
    H: HashHistoryRepository,
    C: ConvergenceHistoryRepository,
    S: ChangeStateRepository,
{
    root: PathBuf,
    scanner: FileStabilityScanner<H>,
    scorer: ConvergenceScorer,
    history: Arc<C>,
    change_state: Arc<S>,
    roster: AgentRoster,
}

impl<H, C, S> ConvergencePipeline<H, C, S>
where
    H: HashHistoryRepository,
    C: ConvergenceHistoryRepository,
    S: ChangeStateRepository,
{
    pub fn new(
        root: impl Into<PathBuf>,
        scanner: FileStabilityScanner<H>,
        scorer: ConvergenceScorer,
        history: Arc<C>,
        change_state: Arc<S>,
        roster: AgentRoster,
    ) -> Self {
        Self {
            root: root.into(),
            scanner,
            scorer,
            history,
            change_state,
            roster,
        }
    }

    fn load_history(&self) -> Vec<ConvergenceMetrics> {
        self.history.load_all().unwrap_or_else(|err| {
            warn!(error = %err, "convergence history unreadable, treating as empty");
            Vec::new()
        })
    }

    /// Run measure, analyze and control for one iteration.
    pub fn run_iteration(&self, inputs: PipelineInputs) -> IterationReport {
        let scan = self
            .roster
            .agent(DmaicPhase::Measure)
            .invoke(|| self.scanner.scan(&self.root));

        // Without a measurement the file dimension is vacuously stable.
        let files = scan
            .completed()
            .map_or(StabilityRatio::new(0, 0), ScanOutcome::ratio);

        let mut trend = None;
        let metrics = self.roster.agent(DmaicPhase::Analyze).invoke(|| {
            let mut history = self.load_history();
            let iteration = scan
                .completed()
                .map_or(history.len() as u64 + 1, |s| s.iteration);

            let record = self.scorer.score(
                iteration,
                &ConvergenceInputs {
                    files,
                    tests: inputs.tests,
                    metrics: inputs.metrics,
                    knowledge: inputs.knowledge,
                    regression_count: inputs.regression_count,
                },
            );

            if let Err(err) = self.history.append(&record) {
                warn!(error = %err, iteration, "failed to persist convergence record");
            }
            history.push(record.clone());
            trend = ConvergenceScorer::trend(&history);
            record
        });

        let changes = self
            .roster
            .agent(DmaicPhase::Control)
            .invoke(|| summarize_changes(self.change_state.as_ref()));

        let unavailable: Vec<Agent> = self
            .roster
            .agents()
            .iter()
            .filter(|agent| !agent.is_enabled())
            .cloned()
            .collect();

        if let Some(record) = metrics.completed() {
            info!(
                iteration = record.iteration,
                score = record.convergence_score,
                maturity = record.maturity().name(),
                converged = record.converged,
                "convergence iteration complete"
            );
        }

        IterationReport {
            scan,
            metrics,
            trend,
            changes,
            unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryChangeStateRepository, InMemoryConvergenceHistoryRepository,
        InMemoryHashHistoryRepository,
    };
    use crate::domain::models::{AgentConfig, ScannerConfig};
    use std::fs;

    fn roster_enabling(phases: &[DmaicPhase]) -> AgentRoster {
        let entries: Vec<AgentConfig> = DmaicPhase::ALL
            .iter()
            .map(|phase| AgentConfig {
                phase: *phase,
                capability: phase.default_capability().to_string(),
                enabled: phases.contains(phase),
            })
            .collect();
        AgentRoster::from_config(&entries)
    }

    type TestPipeline = ConvergencePipeline<
        InMemoryHashHistoryRepository,
        InMemoryConvergenceHistoryRepository,
        InMemoryChangeStateRepository,
    >;

    fn pipeline(
        root: &std::path::Path,
        roster: AgentRoster,
    ) -> (TestPipeline, Arc<InMemoryConvergenceHistoryRepository>) {
        let history = Arc::new(InMemoryConvergenceHistoryRepository::new());
        let scanner = FileStabilityScanner::new(
            Arc::new(InMemoryHashHistoryRepository::new()),
            ScannerConfig::default(),
        );
        let pipeline = ConvergencePipeline::new(
            root,
            scanner,
            ConvergenceScorer::default(),
            Arc::clone(&history),
            Arc::new(InMemoryChangeStateRepository::new()),
            roster,
        );
        (pipeline, history)
    }

    fn perfect_inputs() -> PipelineInputs {
        PipelineInputs {
            tests: StabilityRatio::new(10, 10),
            metrics: StabilityRatio::new(5, 5),
            knowledge: StabilityRatio::new(12, 10),
            regression_count: 0,
        }
    }

    #[test]
    fn test_iterations_build_history_and_trend() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "a").unwrap();
        let (pipeline, history) = pipeline(dir.path(), AgentRoster::default());

        let first = pipeline.run_iteration(perfect_inputs());
        assert!(first.trend.is_none());
        // No baseline yet: 0.30 * 0 + 25 + 20 + 15 + 10
        let record = first.metrics.completed().unwrap();
        assert!((record.convergence_score - 70.0).abs() < 1e-9);
        assert!(!first.converged());

        pipeline.run_iteration(perfect_inputs());
        let third = pipeline.run_iteration(perfect_inputs());
        assert!(third.converged());
        let trend = third.trend.unwrap();
        assert!((trend.delta - 30.0).abs() < 1e-9);

        assert_eq!(history.load_all().unwrap().len(), 3);
        assert_eq!(third.unavailable.len(), 2);
    }

    #[test]
    fn test_disabled_measure_uses_vacuous_file_stability() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "a").unwrap();
        let roster = roster_enabling(&[DmaicPhase::Analyze, DmaicPhase::Control]);
        let (pipeline, _) = pipeline(dir.path(), roster);

        let report = pipeline.run_iteration(perfect_inputs());
        assert!(report.scan.is_unavailable());
        let record = report.metrics.completed().unwrap();
        assert_eq!(record.files_total, 0);
        assert!((record.file_stability_pct - 100.0).abs() < f64::EPSILON);
        assert!(report.converged());
    }

    #[test]
    fn test_disabled_analyze_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let roster = roster_enabling(&[DmaicPhase::Measure]);
        let (pipeline, history) = pipeline(dir.path(), roster);

        let report = pipeline.run_iteration(perfect_inputs());
        assert!(report.metrics.is_unavailable());
        assert!(report.changes.is_unavailable());
        assert!(report.trend.is_none());
        assert!(history.load_all().unwrap().is_empty());
        assert_eq!(report.scan.completed().unwrap().iteration, 1);
    }
}
