//! Per-release stage machine
//!
//! ```text
//! Detected → Filtered → Aggregated → Computed → Persisted
//!     │                                  └────→ Frozen   (write failed)
//!     ├──→ Frozen
//!     └──→ Dropped
//! ```
//!
//! `Computed → Frozen` covers a release whose snapshot could not be written:
//! its values are reported but history keeps the previous state.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Where a release is in one engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStage {
    /// Release id found in the project data
    Detected,
    /// Project data narrowed to the release
    Filtered,
    /// Run statistics aggregated
    Aggregated,
    /// KPIs computed
    Computed,
    /// Not recomputed this run
    Frozen,
    /// Snapshot written
    Persisted,
    /// Runs without plans; nothing to measure
    Dropped,
}

impl ReleaseStage {
    /// No further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl Display for ReleaseStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Detected => "detected",
            Self::Filtered => "filtered",
            Self::Aggregated => "aggregated",
            Self::Computed => "computed",
            Self::Frozen => "frozen",
            Self::Persisted => "persisted",
            Self::Dropped => "dropped",
        })
    }
}

/// Validate a stage transition
///
/// # Errors
/// [`EngineError::IllegalTransition`] if `to` is not reachable from `from`
pub fn validate_transition(from: ReleaseStage, to: ReleaseStage) -> Result<(), EngineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(EngineError::IllegalTransition { from, to })
    }
}

/// Stages reachable in one step
#[must_use]
pub fn allowed_transitions(from: ReleaseStage) -> Vec<ReleaseStage> {
    use ReleaseStage::{Aggregated, Computed, Detected, Dropped, Filtered, Frozen, Persisted};
    match from {
        Detected => vec![Filtered, Frozen, Dropped],
        Filtered => vec![Aggregated],
        Aggregated => vec![Computed],
        Computed => vec![Persisted, Frozen],
        Frozen | Persisted | Dropped => vec![],
    }
}

/// Stage tracker for one release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTracker {
    stage: ReleaseStage,
}

impl StageTracker {
    /// Start at `Detected`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: ReleaseStage::Detected,
        }
    }

    /// Current stage
    #[inline]
    #[must_use]
    pub fn stage(&self) -> ReleaseStage {
        self.stage
    }

    /// Move to `to`
    ///
    /// # Errors
    /// If the transition is not allowed; the stage is left unchanged
    pub fn advance(&mut self, to: ReleaseStage) -> Result<(), EngineError> {
        validate_transition(self.stage, to)?;
        self.stage = to;
        Ok(())
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
