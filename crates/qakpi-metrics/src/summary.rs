//! Release summary rows
//!
//! One denormalized row per (project, release) for the consolidated panel.
//! Percentages are clamped to `[0, 100]`, counts to `>= 0`.

use crate::kpi::{names, KpiDatum};
use serde::{Deserialize, Serialize};

/// Where a row's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    /// Computed from source data in this run
    Computed,
    /// Restored from frozen history
    History,
}

/// One row per (project, release)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSummaryRow {
    /// Project code
    pub project: String,
    /// Official release id
    pub release: String,
    /// Planned scope
    pub planned_scope: u64,
    /// Executed cases
    pub executed: u64,
    /// Coverage percentage
    pub coverage_pct: f64,
    /// Passed percentage (`None` = N/A)
    pub passed_pct: Option<f64>,
    /// Failed percentage
    pub failed_pct: Option<f64>,
    /// Blocked (including skipped) percentage
    pub blocked_pct: Option<f64>,
    /// Retest percentage
    pub retest_pct: Option<f64>,
    /// Origin of the values
    pub source: RowSource,
}

impl ReleaseSummaryRow {
    /// Build a row from a release's KPI data
    ///
    /// Missing KPIs count as zero (counts, coverage) or N/A (results mix).
    #[must_use]
    pub fn from_kpis(
        project: impl Into<String>,
        release: impl Into<String>,
        kpis: &[KpiDatum],
        source: RowSource,
    ) -> Self {
        let value = |name: &str| {
            kpis.iter()
                .find(|d| d.name == name)
                .and_then(|d| d.value.as_f64())
        };
        let percent = |name: &str| value(name).map(clamp_percent);

        Self {
            project: project.into(),
            release: release.into(),
            planned_scope: clamp_count(value(names::PLANNED_SCOPE)),
            executed: clamp_count(value(names::EXECUTED_CASES)),
            coverage_pct: percent(names::COVERAGE_PCT).unwrap_or(0.0),
            passed_pct: percent(names::PASSED_PCT),
            failed_pct: percent(names::FAILED_PCT),
            blocked_pct: percent(names::BLOCKED_PCT),
            retest_pct: percent(names::RETEST_PCT),
            source,
        }
    }

    /// Whether the release has any executed results
    #[inline]
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.passed_pct.is_some()
    }
}

/// Clamp a percentage into `[0, 100]`; NaN becomes 0
#[inline]
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}
