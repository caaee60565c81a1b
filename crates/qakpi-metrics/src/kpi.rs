//! KPI values and data
//!
//! A [`KpiDatum`] is one named, labelled value tagged with project and
//! release. It feeds both report rendering and history snapshots.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Well-known KPI names
pub mod names {
    //! Names of the KPIs produced by the default calculators

    /// Planned scope (declared cases)
    pub const PLANNED_SCOPE: &str = "planned_scope";
    /// Executed cases
    pub const EXECUTED_CASES: &str = "executed_cases";
    /// Coverage percentage
    pub const COVERAGE_PCT: &str = "coverage_pct";
    /// Passed percentage
    pub const PASSED_PCT: &str = "passed_pct";
    /// Failed percentage
    pub const FAILED_PCT: &str = "failed_pct";
    /// Blocked (including skipped) percentage
    pub const BLOCKED_PCT: &str = "blocked_pct";
    /// Retest percentage
    pub const RETEST_PCT: &str = "retest_pct";
}

/// Value of one KPI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KpiValue {
    /// Whole count
    Count {
        /// Count value
        value: u64,
    },
    /// Percentage with display precision
    Percent {
        /// Percentage value
        value: f64,
        /// Decimal places shown
        precision: u8,
    },
    /// Not applicable (e.g. release never executed)
    NotApplicable,
}

impl KpiValue {
    /// Count value
    #[inline]
    #[must_use]
    pub fn count(value: u64) -> Self {
        Self::Count { value }
    }

    /// Percentage value
    #[inline]
    #[must_use]
    pub fn percent(value: f64, precision: u8) -> Self {
        Self::Percent { value, precision }
    }

    /// Numeric value, `None` for N/A
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Count { value } => Some(*value as f64),
            Self::Percent { value, .. } => Some(*value),
            Self::NotApplicable => None,
        }
    }

    /// Whether the value is present
    #[inline]
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }

    /// Display text: `50`, `80.00%`, `N/A`
    #[must_use]
    pub fn formatted(&self) -> String {
        self.to_string()
    }

    /// Rebuild a value from a stored raw number
    ///
    /// Percent KPIs are recognised by their `_pct` suffix; coverage is shown
    /// as a whole number, every other percentage with two decimals.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn restore(name: &str, raw: Option<f64>) -> Self {
        match raw {
            None => Self::NotApplicable,
            Some(v) if name == names::COVERAGE_PCT => Self::percent(v, 0),
            Some(v) if name.ends_with("_pct") => Self::percent(v, 2),
            Some(v) => Self::count(v.max(0.0).round() as u64),
        }
    }
}

impl Display for KpiValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count { value } => write!(f, "{value}"),
            Self::Percent { value, precision } => {
                write!(f, "{value:.prec$}%", prec = usize::from(*precision))
            }
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// One KPI value for one (project, release)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDatum {
    /// Machine name (see [`names`])
    pub name: String,
    /// Human label
    pub label: String,
    /// Value
    pub value: KpiValue,
    /// Project code
    pub project: String,
    /// Official release id
    pub release: String,
}

impl KpiDatum {
    /// Create datum
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        value: KpiValue,
        project: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value,
            project: project.into(),
            release: release.into(),
        }
    }
}
