//! Convergence gate: is the latest recorded run converged?

use serde::Serialize;
use tracing::warn;

use crate::domain::models::{ConvergenceMetrics, MaturityThresholds};
use crate::domain::ports::ConvergenceHistoryRepository;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GateVerdict {
    Converged {
        iteration: u64,
        score: f64,
    },
    NotConverged {
        iteration: u64,
        score: f64,
        threshold: f64,
        /// Points still missing to reach the threshold.
        gap: f64,
    },
    NoHistory,
}

impl GateVerdict {
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    fn from_record(record: &ConvergenceMetrics, thresholds: &MaturityThresholds) -> Self {
        if record.converged {
            Self::Converged {
                iteration: record.iteration,
                score: record.convergence_score,
            }
        } else {
            Self::NotConverged {
                iteration: record.iteration,
                score: record.convergence_score,
                threshold: thresholds.converged,
                gap: ((thresholds.converged - record.convergence_score).max(0.0) * 100.0).round()
                    / 100.0,
            }
        }
    }
}

/// Judge the most recent record.
///
/// The verdict uses the `converged` flag stored with the record, so changing
/// the thresholds later does not rewrite history. An unreadable history is
/// reported as having none.
pub fn check_convergence<R>(history: &R, thresholds: &MaturityThresholds) -> GateVerdict
where
    R: ConvergenceHistoryRepository + ?Sized,
{
    match history.latest() {
        Ok(Some(record)) => GateVerdict::from_record(&record, thresholds),
        Ok(None) => GateVerdict::NoHistory,
        Err(err) => {
            warn!(error = %err, "convergence history unreadable");
            GateVerdict::NoHistory
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryConvergenceHistoryRepository;
    use crate::domain::models::{ConvergenceInputs, StabilityRatio};
    use crate::services::ConvergenceScorer;

    #[test]
    fn test_empty_history() {
        let history = InMemoryConvergenceHistoryRepository::new();
        let verdict = check_convergence(&history, &MaturityThresholds::default());
        assert_eq!(verdict, GateVerdict::NoHistory);
        assert!(!verdict.passed());
    }

    #[test]
    fn test_latest_record_decides() {
        let scorer = ConvergenceScorer::default();
        let history = InMemoryConvergenceHistoryRepository::new();

        history.append(&scorer.score(1, &ConvergenceInputs::default())).unwrap();
        assert!(check_convergence(&history, &MaturityThresholds::default()).passed());

        let failing = ConvergenceInputs {
            tests: StabilityRatio::new(0, 10),
            ..ConvergenceInputs::default()
        };
        history.append(&scorer.score(2, &failing)).unwrap();

        match check_convergence(&history, &MaturityThresholds::default()) {
            GateVerdict::NotConverged { iteration, score, gap, .. } => {
                assert_eq!(iteration, 2);
                assert!((score - 75.0).abs() < 1e-9);
                assert!((gap - 20.0).abs() < 1e-9);
            }
            other => panic!("Expected NotConverged, got {other:?}"),
        }
    }
}
