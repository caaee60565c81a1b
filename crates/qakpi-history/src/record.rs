//! History records
//!
//! One persisted snapshot of one KPI datum. The on-disk shape is
//! `{kpi, project, release, timestamp, value, details: {label, formatted, trend}}`.

use chrono::{DateTime, Utc};
use qakpi_metrics::{KpiDatum, KpiValue};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Movement of a KPI against the closest older release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Value went up
    Up,
    /// Value went down
    Down,
    /// Value unchanged
    Flat,
    /// Nothing to compare against
    #[default]
    #[serde(rename = "none")]
    Unavailable,
}

impl Trend {
    /// Compare a current value with a previous one
    #[must_use]
    pub fn between(current: Option<f64>, previous: Option<f64>) -> Self {
        match (current, previous) {
            (Some(c), Some(p)) if (c - p).abs() < 1e-9 => Self::Flat,
            (Some(c), Some(p)) if c > p => Self::Up,
            (Some(_), Some(_)) => Self::Down,
            _ => Self::Unavailable,
        }
    }
}

impl Display for Trend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
            Self::Unavailable => "none",
        })
    }
}

/// Presentation details stored next to the raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDetails {
    /// Human label
    pub label: String,
    /// Display text (`80.00%`, `N/A`)
    pub formatted: String,
    /// Trend against the previous release
    #[serde(default)]
    pub trend: Trend,
}

/// Persisted snapshot of one KPI datum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// KPI name
    pub kpi: String,
    /// Project code
    pub project: String,
    /// Official release id
    pub release: String,
    /// Snapshot time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Raw value, `None` for N/A
    pub value: Option<f64>,
    /// Label, formatted value and trend
    pub details: HistoryDetails,
}

impl HistoryRecord {
    /// Snapshot a datum
    #[must_use]
    pub fn from_datum(datum: &KpiDatum, timestamp: DateTime<Utc>, trend: Trend) -> Self {
        Self {
            kpi: datum.name.clone(),
            project: datum.project.clone(),
            release: datum.release.clone(),
            timestamp,
            value: datum.value.as_f64(),
            details: HistoryDetails {
                label: datum.label.clone(),
                formatted: datum.value.formatted(),
                trend,
            },
        }
    }

    /// Rebuild the datum this record was taken from
    #[must_use]
    pub fn to_datum(&self) -> KpiDatum {
        KpiDatum::new(
            self.kpi.clone(),
            self.details.label.clone(),
            KpiValue::restore(&self.kpi, self.value),
            self.project.clone(),
            self.release.clone(),
        )
    }
}
