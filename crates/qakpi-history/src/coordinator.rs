//! History coordination and the freeze policy
//!
//! A release's snapshot is final once a newer release has been recorded.
//! The policy is a predicate over a [`HistoryIndex`] built once per project
//! run: process a release when the project has no history, when the release
//! has never been recorded, or when it is the newest recorded release.
//! Every other release is frozen.

use crate::error::HistoryError;
use crate::ordering::ReleaseOrdering;
use crate::record::{HistoryRecord, Trend};
use crate::repository::HistoryStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a release will or will not be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessDecision {
    /// The project has no history at all
    NoHistory,
    /// History exists but not for this release
    UnseenRelease,
    /// This is the newest recorded release
    NewestRelease,
    /// An older recorded release; its snapshot is final
    Frozen,
}

impl ProcessDecision {
    /// Whether the release is recomputed
    #[inline]
    #[must_use]
    pub fn should_process(self) -> bool {
        !matches!(self, Self::Frozen)
    }
}

/// Loaded history of one project
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    project: String,
    ordering: ReleaseOrdering,
    releases: BTreeMap<String, Vec<HistoryRecord>>,
    newest: Option<String>,
}

impl HistoryIndex {
    /// Index with no history
    #[must_use]
    pub fn empty(project: impl Into<String>, ordering: ReleaseOrdering) -> Self {
        Self {
            project: project.into(),
            ordering,
            ..Self::default()
        }
    }

    /// Build from loaded records
    #[must_use]
    pub fn from_records(
        project: impl Into<String>,
        records: Vec<HistoryRecord>,
        ordering: ReleaseOrdering,
    ) -> Self {
        let mut releases: BTreeMap<String, Vec<HistoryRecord>> = BTreeMap::new();
        for record in records {
            releases.entry(record.release.clone()).or_default().push(record);
        }
        let newest = ordering
            .newest(releases.keys().map(String::as_str))
            .map(str::to_string);

        Self {
            project: project.into(),
            ordering,
            releases,
            newest,
        }
    }

    /// Project code
    #[inline]
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// No release recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Number of recorded releases
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Release has a snapshot
    #[inline]
    #[must_use]
    pub fn contains(&self, release: &str) -> bool {
        self.releases.contains_key(release)
    }

    /// Newest recorded release
    #[inline]
    #[must_use]
    pub fn newest(&self) -> Option<&str> {
        self.newest.as_deref()
    }

    /// Recorded release ids
    pub fn releases(&self) -> impl Iterator<Item = &str> {
        self.releases.keys().map(String::as_str)
    }

    /// Stored records of one release
    #[must_use]
    pub fn records(&self, release: &str) -> &[HistoryRecord] {
        self.releases.get(release).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Freeze policy for one release
    #[must_use]
    pub fn decide(&self, release: &str) -> ProcessDecision {
        if self.is_empty() {
            ProcessDecision::NoHistory
        } else if !self.contains(release) {
            ProcessDecision::UnseenRelease
        } else if self.newest() == Some(release) {
            ProcessDecision::NewestRelease
        } else {
            ProcessDecision::Frozen
        }
    }

    /// Shorthand for `decide(release).should_process()`
    #[inline]
    #[must_use]
    pub fn should_process(&self, release: &str) -> bool {
        self.decide(release).should_process()
    }

    /// Closest recorded release strictly older than `release`
    #[must_use]
    pub fn previous_release(&self, release: &str) -> Option<&str> {
        let ordering = self.ordering;
        ordering.newest(
            self.releases()
                .filter(|r| ordering.compare(r, release) == std::cmp::Ordering::Less),
        )
    }

    /// Value of `kpi` in the closest older release
    #[must_use]
    pub fn previous_value(&self, release: &str, kpi: &str) -> Option<f64> {
        let previous = self.previous_release(release)?;
        self.records(previous)
            .iter()
            .find(|r| r.kpi == kpi)
            .and_then(|r| r.value)
    }

    /// Trend of `kpi` for `release` against the closest older release
    #[must_use]
    pub fn trend(&self, release: &str, kpi: &str, current: Option<f64>) -> Trend {
        Trend::between(current, self.previous_value(release, kpi))
    }
}

/// Loads history indexes and persists snapshots through a store
#[derive(Debug)]
pub struct HistoryCoordinator<S> {
    store: S,
    ordering: ReleaseOrdering,
}

impl<S: HistoryStore> HistoryCoordinator<S> {
    /// Create coordinator over a store
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            ordering: ReleaseOrdering::default(),
        }
    }

    /// With release ordering
    #[inline]
    #[must_use]
    pub fn with_ordering(mut self, ordering: ReleaseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Release ordering in use
    #[inline]
    #[must_use]
    pub fn ordering(&self) -> ReleaseOrdering {
        self.ordering
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a project's history
    ///
    /// A failed load is treated as "no history" and logged.
    #[must_use]
    pub fn load_index(&self, project: &str) -> HistoryIndex {
        match self.store.load_project(project) {
            Ok(records) => {
                let index = HistoryIndex::from_records(project, records, self.ordering);
                tracing::debug!(
                    project,
                    releases = index.len(),
                    newest = index.newest().unwrap_or("-"),
                    "loaded KPI history"
                );
                index
            }
            Err(e) => {
                tracing::warn!(project, error = %e, "history unavailable, treating project as new");
                HistoryIndex::empty(project, self.ordering)
            }
        }
    }

    /// Overwrite one release's snapshot
    ///
    /// # Errors
    /// If the store rejects the write
    pub fn persist(
        &self,
        project: &str,
        release: &str,
        records: &[HistoryRecord],
    ) -> Result<(), HistoryError> {
        self.store.save(project, release, records)
    }
}
