//! Testing utilities for the QAKPI workspace
//!
//! Shared fixtures, stores and file helpers.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use qakpi_history::{HistoryError, HistoryRecord, HistoryStore, MemoryHistoryStore};
use qakpi_release::{PlanRecord, ProjectData, RunCounters, RunRecord};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn later_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 17, 30, 0).unwrap()
}

pub fn plan(id: &str, title: &str, cases: u64) -> PlanRecord {
    PlanRecord::new(id, title, cases)
}

pub fn tagged_plan(id: &str, release: &str, cases: u64) -> PlanRecord {
    PlanRecord::new(id, format!("Plan {id}"), cases).with_release(release)
}

pub fn run(id: &str, release: &str, passed: u64, failed: u64) -> RunRecord {
    run_with(
        id,
        release,
        RunCounters {
            passed,
            failed,
            total: passed + failed,
            ..RunCounters::default()
        },
    )
}

pub fn run_with(id: &str, release: &str, counters: RunCounters) -> RunRecord {
    RunRecord::new(id, release, counters)
}

/// Project with an older (`R1`) and a newer (`R2`) tagged release
pub fn two_release_project() -> ProjectData {
    ProjectData::new(
        vec![tagged_plan("p1", "R1", 20), tagged_plan("p2", "R2", 40)],
        vec![run("r1", "R1", 15, 5), run("r2", "R2", 10, 10)],
    )
}

/// Raw upstream payload in the loose shape collaborators send
pub fn raw_project_json() -> serde_json::Value {
    serde_json::json!({
        "plan": [
            {"id": 101, "name": "Release 3.3.0_STAGE regression", "totalCases": 30, "createdOn": "2024-05-02"},
            {"id": "102", "title": "Release 3.3.0_STAGE smoke", "caseCount": "20"},
            {"id": 103, "title": "Team offsite"},
            {"title": "missing id"}
        ],
        "run": [
            {"id": 1, "planId": 101, "releaseId": "3.3.0_stage",
             "stats": {"passed": 16, "failed": 2, "blocked": 1, "skipped": 1, "untested": 10, "total": 30}},
            {"id": 2, "release": "3.3.0_STAGE", "passed_count": 5, "failed_count": 0, "untested_count": 15, "total_count": 20},
            {"id": 3, "release": "4.0_PROD", "passed": 3}
        ]
    })
}

/// Memory store whose writes fail for selected projects
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryHistoryStore,
    read_only: HashSet<String>,
}

impl FailingStore {
    pub fn new<I, S>(read_only: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: MemoryHistoryStore::new(),
            read_only: read_only.into_iter().map(Into::into).collect(),
        }
    }

    pub fn inner(&self) -> &MemoryHistoryStore {
        &self.inner
    }
}

impl HistoryStore for FailingStore {
    fn save(
        &self,
        project: &str,
        release: &str,
        records: &[HistoryRecord],
    ) -> Result<(), HistoryError> {
        if self.read_only.contains(project) {
            return Err(HistoryError::Store(format!("{project} is read-only")));
        }
        self.inner.save(project, release, records)
    }

    fn load_project(&self, project: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        self.inner.load_project(project)
    }
}

/// Every file under `root` with its bytes, keyed by relative path
pub fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(bytes) = std::fs::read(&path) {
                let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.insert(rel, bytes);
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}
