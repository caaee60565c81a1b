//! Raw plan and run records
//!
//! Upstream collaborators hand over JSON-like trees. Deserialization is
//! lenient: ids may be numbers or strings, counters may be missing, null,
//! negative or numeric strings, and run counters may sit under `stats` or
//! directly on the run (`stats` wins).

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Test plan record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    /// Plan id
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Free-text title, parsed for a release identifier
    #[serde(default, alias = "name")]
    pub title: String,
    /// Previously assigned release tag
    #[serde(
        default,
        alias = "releaseId",
        alias = "release_id",
        alias = "releaseTag",
        deserialize_with = "opt_string"
    )]
    pub release: Option<String>,
    /// Declared number of test cases
    #[serde(
        default,
        alias = "caseCount",
        alias = "totalCases",
        alias = "cases",
        deserialize_with = "lenient_count"
    )]
    pub case_count: u64,
    /// Plan date as supplied upstream
    #[serde(default, alias = "createdOn", alias = "created_on", deserialize_with = "opt_string")]
    pub date: Option<String>,
}

impl PlanRecord {
    /// Create plan with id, title and case count
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, case_count: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            case_count,
            ..Self::default()
        }
    }

    /// With release tag
    #[inline]
    #[must_use]
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    /// With date
    #[inline]
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Per-status counters of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Passed cases
    #[serde(default, alias = "passed_count", deserialize_with = "lenient_count")]
    pub passed: u64,
    /// Failed cases
    #[serde(default, alias = "failed_count", deserialize_with = "lenient_count")]
    pub failed: u64,
    /// Blocked cases
    #[serde(default, alias = "blocked_count", deserialize_with = "lenient_count")]
    pub blocked: u64,
    /// Skipped cases
    #[serde(default, alias = "skipped_count", deserialize_with = "lenient_count")]
    pub skipped: u64,
    /// Cases marked for retest
    #[serde(default, alias = "retest_count", deserialize_with = "lenient_count")]
    pub retest: u64,
    /// Cases not yet executed
    #[serde(default, alias = "untested_count", deserialize_with = "lenient_count")]
    pub untested: u64,
    /// Total cases (0 means "not supplied")
    #[serde(default, alias = "total_count", deserialize_with = "lenient_count")]
    pub total: u64,
}

impl RunCounters {
    /// Sum of the individual status counters
    #[inline]
    #[must_use]
    pub fn status_sum(&self) -> u64 {
        [
            self.passed,
            self.failed,
            self.blocked,
            self.skipped,
            self.retest,
            self.untested,
        ]
        .into_iter()
        .fold(0, u64::saturating_add)
    }

    /// Supplied total, or the status sum when no total was given
    #[inline]
    #[must_use]
    pub fn effective_total(&self) -> u64 {
        if self.total == 0 {
            self.status_sum()
        } else {
            self.total
        }
    }
}

/// Test run record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run id
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Parent plan id
    #[serde(
        default,
        alias = "planId",
        alias = "parent",
        alias = "parent_id",
        deserialize_with = "opt_id_string"
    )]
    pub plan_id: Option<String>,
    /// Release tag
    #[serde(
        default,
        alias = "releaseId",
        alias = "release_id",
        alias = "releaseTag",
        deserialize_with = "opt_string"
    )]
    pub release: Option<String>,
    /// Nested counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunCounters>,
    /// Flat counters
    #[serde(flatten)]
    pub flat: RunCounters,
}

impl RunRecord {
    /// Create run with release tag and counters
    #[must_use]
    pub fn new(id: impl Into<String>, release: impl Into<String>, counters: RunCounters) -> Self {
        Self {
            id: id.into(),
            release: Some(release.into()),
            stats: Some(counters),
            ..Self::default()
        }
    }

    /// With parent plan id
    #[inline]
    #[must_use]
    pub fn with_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    /// Counters to aggregate: nested `stats` if present, else flat fields
    #[inline]
    #[must_use]
    pub fn counters(&self) -> &RunCounters {
        self.stats.as_ref().unwrap_or(&self.flat)
    }
}

/// All plans and runs of one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectData {
    /// Test plans
    pub plans: Vec<PlanRecord>,
    /// Test runs
    pub runs: Vec<RunRecord>,
}

impl ProjectData {
    /// Create from records
    #[inline]
    #[must_use]
    pub fn new(plans: Vec<PlanRecord>, runs: Vec<RunRecord>) -> Self {
        Self { plans, runs }
    }

    /// Read `plan`/`run` arrays (or `plans`/`runs`) from a JSON tree
    ///
    /// Entries that do not deserialize are skipped with a warning.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            plans: entries(value, &["plan", "plans"]),
            runs: entries(value, &["run", "runs"]),
        }
    }

    /// Parse JSON text, then read it like [`ProjectData::from_value`]
    ///
    /// # Errors
    /// If the text is not JSON at all
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// No plans and no runs
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty() && self.runs.is_empty()
    }
}

fn entries<T: serde::de::DeserializeOwned>(value: &Value, keys: &[&str]) -> Vec<T> {
    let Some(items) = keys.iter().find_map(|k| value.get(k)).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, key = keys[0], error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {other}"))),
    }
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 }))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |f| if f > 0.0 { f as u64 } else { 0 }),
        _ => 0,
    };
    Ok(count)
}
