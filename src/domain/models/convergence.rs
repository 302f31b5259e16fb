//! Convergence metrics, maturity levels and trends.
//!
//! A pipeline run is summarized by five signals: file stability, test
//! stability, metric stability, knowledge growth and a regression count. The
//! scorer folds them into a single 0-100 `convergence_score` and classifies it
//! into a [`MaturityLevel`]. Each run produces one immutable
//! [`ConvergenceMetrics`] record that is appended to the history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Ratios
// ============================================================================

/// A numerator/denominator pair such as "48 of 50 tests stable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityRatio {
    pub numerator: u64,
    pub denominator: u64,
}

impl StabilityRatio {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `numerator / denominator * 100`.
    ///
    /// An empty ratio (0/0) is vacuously stable and yields 100.0. A non-zero
    /// numerator over a zero denominator also yields 100.0 so the result never
    /// becomes infinite. The result is not capped above: knowledge growth
    /// ratios legitimately exceed 100.
    pub fn percentage(&self) -> f64 {
        if self.denominator == 0 {
            return 100.0;
        }
        self.numerator as f64 / self.denominator as f64 * 100.0
    }
}

impl fmt::Display for StabilityRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl std::str::FromStr for StabilityRatio {
    type Err = String;

    /// Parse `"N/D"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| format!("expected N/D, got '{s}'"))?;
        let numerator = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid numerator in '{s}'"))?;
        let denominator = den
            .trim()
            .parse()
            .map_err(|_| format!("invalid denominator in '{s}'"))?;
        Ok(Self::new(numerator, denominator))
    }
}

// ============================================================================
// Maturity
// ============================================================================

/// Discrete maturity classification of a convergence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaturityLevel {
    Planning = 0,
    Foundation = 1,
    Development = 2,
    Production = 3,
}

impl MaturityLevel {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Planning),
            1 => Some(Self::Foundation),
            2 => Some(Self::Development),
            3 => Some(Self::Production),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Foundation => "Foundation",
            Self::Development => "Development",
            Self::Production => "Production",
        }
    }
}

impl fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

// ============================================================================
// Inputs and records
// ============================================================================

/// The raw signals for one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceInputs {
    pub files: StabilityRatio,
    pub tests: StabilityRatio,
    pub metrics: StabilityRatio,
    /// Current knowledge-pack size over its baseline size.
    pub knowledge: StabilityRatio,
    pub regression_count: u32,
}

impl Default for ConvergenceInputs {
    /// Every ratio empty (vacuously 100%) and no regressions.
    fn default() -> Self {
        Self {
            files: StabilityRatio::new(0, 0),
            tests: StabilityRatio::new(0, 0),
            metrics: StabilityRatio::new(0, 0),
            knowledge: StabilityRatio::new(0, 0),
            regression_count: 0,
        }
    }
}

/// One run's convergence record. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceMetrics {
    pub iteration: u64,
    pub timestamp: DateTime<Utc>,

    pub files_stable: u64,
    pub files_total: u64,
    pub file_stability_pct: f64,

    pub tests_stable: u64,
    pub tests_total: u64,
    pub test_stability_pct: f64,

    pub metrics_stable: u64,
    pub metrics_total: u64,
    pub metric_stability_pct: f64,

    pub knowledge_current: u64,
    pub knowledge_baseline: u64,
    /// Raw growth percentage; may exceed 100.
    pub knowledge_growth_pct: f64,

    pub regression_count: u32,

    /// Weighted score in [0, 100], rounded to two decimals.
    pub convergence_score: f64,
    pub converged: bool,
    pub maturity_level: u8,
}

impl ConvergenceMetrics {
    /// Maturity level as an enum. Out-of-range values from hand-edited history
    /// files fall back to `Planning`.
    pub fn maturity(&self) -> MaturityLevel {
        MaturityLevel::from_u8(self.maturity_level).unwrap_or(MaturityLevel::Planning)
    }
}

/// Score change between the two most recent records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTrend {
    pub previous_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl ConvergenceTrend {
    pub fn between(previous_score: f64, current_score: f64) -> Self {
        Self {
            previous_score,
            current_score,
            delta: ((current_score - previous_score) * 100.0).round() / 100.0,
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.delta > 0.0 {
            "improving"
        } else if self.delta < 0.0 {
            "declining"
        } else {
            "flat"
        }
    }
}
