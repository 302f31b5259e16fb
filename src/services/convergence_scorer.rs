//! Convergence scorer.
//!
//! Folds the five run signals into a weighted 0-100 score and classifies it.
//!
//! ```text
//! score = w_file  * clamp(file_pct)
//!       + w_test  * clamp(test_pct)
//!       + w_metric* clamp(metric_pct)
//!       + w_know  * clamp(knowledge_pct)
//!       + w_regr  * (100 if regressions == 0 else 0)
//! ```
//!
//! Every percentage is clamped to `[0, 100]` before weighting, so a knowledge
//! pack that grew by 150% contributes exactly what 100% would.

use chrono::Utc;

use crate::domain::models::{
    ConvergenceCalculationConfig, ConvergenceInputs, ConvergenceMetrics, ConvergenceTrend,
    MaturityLevel,
};

fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted convergence scorer with configurable weights and thresholds.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceScorer {
    calculation: ConvergenceCalculationConfig,
}

impl ConvergenceScorer {
    /// The configuration is expected to have passed
    /// `ConfigLoader::validate_calculation`; the loader falls back to the
    /// defaults when it does not.
    pub const fn new(calculation: ConvergenceCalculationConfig) -> Self {
        Self { calculation }
    }

    pub const fn calculation(&self) -> &ConvergenceCalculationConfig {
        &self.calculation
    }

    /// Binary regression gate.
    pub const fn regression_score(regression_count: u32) -> f64 {
        if regression_count == 0 {
            100.0
        } else {
            0.0
        }
    }

    /// Weighted score rounded to two decimals.
    pub fn weighted_score(&self, inputs: &ConvergenceInputs) -> f64 {
        let w = &self.calculation.weights;
        let raw = w.file_stability * clamp_pct(inputs.files.percentage())
            + w.test_stability * clamp_pct(inputs.tests.percentage())
            + w.metric_stability * clamp_pct(inputs.metrics.percentage())
            + w.knowledge_growth * clamp_pct(inputs.knowledge.percentage())
            + w.zero_regressions * Self::regression_score(inputs.regression_count);

        round2(raw).clamp(0.0, 100.0)
    }

    /// Step function over the thresholds, highest first.
    pub fn maturity_level(&self, score: f64) -> MaturityLevel {
        let t = &self.calculation.thresholds;
        if score >= t.converged {
            MaturityLevel::Production
        } else if score >= t.stable {
            MaturityLevel::Development
        } else if score >= t.developing {
            MaturityLevel::Foundation
        } else {
            MaturityLevel::Planning
        }
    }

    /// Ties with the threshold count as converged.
    pub fn is_converged(&self, score: f64) -> bool {
        score >= self.calculation.thresholds.converged
    }

    /// Build the immutable record for one run.
    pub fn score(&self, iteration: u64, inputs: &ConvergenceInputs) -> ConvergenceMetrics {
        let convergence_score = self.weighted_score(inputs);

        ConvergenceMetrics {
            iteration,
            timestamp: Utc::now(),
            files_stable: inputs.files.numerator,
            files_total: inputs.files.denominator,
            file_stability_pct: round2(inputs.files.percentage()),
            tests_stable: inputs.tests.numerator,
            tests_total: inputs.tests.denominator,
            test_stability_pct: round2(inputs.tests.percentage()),
            metrics_stable: inputs.metrics.numerator,
            metrics_total: inputs.metrics.denominator,
            metric_stability_pct: round2(inputs.metrics.percentage()),
            knowledge_current: inputs.knowledge.numerator,
            knowledge_baseline: inputs.knowledge.denominator,
            knowledge_growth_pct: round2(inputs.knowledge.percentage()),
            regression_count: inputs.regression_count,
            convergence_score,
            converged: self.is_converged(convergence_score),
            maturity_level: self.maturity_level(convergence_score).as_u8(),
        }
    }

    /// `current - previous` over the last two records; `None` with fewer than two.
    pub fn trend(history: &[ConvergenceMetrics]) -> Option<ConvergenceTrend> {
        match history {
            [.., previous, current] => Some(ConvergenceTrend::between(
                previous.convergence_score,
                current.convergence_score,
            )),
            _ => None,
        }
    }
}
