//! KPI engine
//!
//! Drives one project through the pipeline:
//!
//! 1. Detect release ids in plans and runs (or use the caller's default)
//! 2. Ask the history index whether each release is processed or frozen
//! 3. Filter, aggregate, compute, build the summary row
//! 4. Persist the release snapshot, overwriting the previous one
//!
//! Frozen releases are never recomputed or rewritten; their rows are
//! restored from history so every report covers every known release.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::stage::{ReleaseStage, StageTracker};
use chrono::{DateTime, SubsecRound, Utc};
use qakpi_history::{
    FileHistoryRepository, HistoryCoordinator, HistoryIndex, HistoryRecord, HistoryStore,
    ProcessDecision, ReleaseOrdering,
};
use qakpi_metrics::{KpiDatum, KpiInput, KpiRegistry, ReleaseSummaryRow, RowSource, RunStatistics};
use qakpi_release::{
    normalize_release_id, IdentifierConfig, ParserCache, ProjectData, ReleaseContext,
    ReleaseGroups, ReleaseMatcher,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Clock used to stamp history records
pub type Clock = fn() -> DateTime<Utc>;

fn system_clock() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// What happened to one release
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    /// Release and its metadata
    pub context: ReleaseContext,
    /// Freeze policy verdict
    pub decision: ProcessDecision,
    /// Final stage reached
    pub stage: ReleaseStage,
}

impl ReleaseOutcome {
    /// Official release id
    #[inline]
    #[must_use]
    pub fn release(&self) -> &str {
        self.context.official_id()
    }
}

/// A snapshot that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceFailure {
    /// Release id
    pub release: String,
    /// Error message
    pub error: String,
}

/// Result of processing one project
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectReport {
    /// Project code
    pub project: String,
    /// KPI data computed in this run, release by release
    pub kpis: Vec<KpiDatum>,
    /// One row per release, computed or restored
    pub rows: Vec<ReleaseSummaryRow>,
    /// Per-release outcome, in processing order
    pub outcomes: Vec<ReleaseOutcome>,
    /// Releases with runs but no plans
    pub dropped: Vec<String>,
    /// Plans with neither a release tag nor a parseable title
    pub unmatched_plans: usize,
    /// Runs without a release tag
    pub untagged_runs: usize,
    /// Snapshots that failed to persist
    pub persistence_failures: Vec<PersistenceFailure>,
}

impl ProjectReport {
    fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Self::default()
        }
    }

    /// Releases whose stage is `stage`
    #[must_use]
    pub fn releases_in(&self, stage: ReleaseStage) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.stage == stage)
            .map(ReleaseOutcome::release)
            .collect()
    }

    /// Summary row of one release
    #[must_use]
    pub fn row(&self, release: &str) -> Option<&ReleaseSummaryRow> {
        self.rows.iter().find(|r| r.release == release)
    }

    /// Every snapshot was written
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.persistence_failures.is_empty()
    }
}

/// A project that failed as a whole
#[derive(Debug)]
pub struct ProjectFailure {
    /// Project code
    pub project: String,
    /// Cause
    pub error: EngineError,
}

/// Result of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Projects that were processed
    pub reports: Vec<ProjectReport>,
    /// Projects that failed
    pub failures: Vec<ProjectFailure>,
}

impl BatchReport {
    /// Every summary row across the batch
    pub fn rows(&self) -> impl Iterator<Item = &ReleaseSummaryRow> {
        self.reports.iter().flat_map(|r| r.rows.iter())
    }

    /// Report of one project
    #[must_use]
    pub fn report(&self, project: &str) -> Option<&ProjectReport> {
        self.reports.iter().find(|r| r.project == project)
    }
}

/// Release KPI engine over a history store
pub struct KpiEngine<S> {
    parsers: ParserCache,
    registry: KpiRegistry,
    history: HistoryCoordinator<S>,
    clock: Clock,
}

impl KpiEngine<FileHistoryRepository> {
    /// Build an engine with a file history store from configuration
    ///
    /// # Errors
    /// If the configuration does not validate
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let store = FileHistoryRepository::new(&config.history.base_dir);
        Ok(Self::new(config.identifier.clone(), store).with_ordering(config.history.ordering))
    }
}

impl<S: HistoryStore> KpiEngine<S> {
    /// Create engine with default calculators
    #[must_use]
    pub fn new(identifier: IdentifierConfig, store: S) -> Self {
        Self {
            parsers: ParserCache::new(identifier),
            registry: KpiRegistry::with_defaults(),
            history: HistoryCoordinator::new(store),
            clock: system_clock,
        }
    }

    /// With release ordering
    #[must_use]
    pub fn with_ordering(mut self, ordering: ReleaseOrdering) -> Self {
        self.history = self.history.with_ordering(ordering);
        self
    }

    /// With calculator registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: KpiRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// With timestamp source
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Parser cache
    #[inline]
    #[must_use]
    pub fn parsers(&self) -> &ParserCache {
        &self.parsers
    }

    /// Calculator registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &KpiRegistry {
        &self.registry
    }

    /// History store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        self.history.store()
    }

    /// Swap the identifier configuration
    ///
    /// # Errors
    /// If the new template does not compile; the old one stays active
    pub fn reload_identifier(&self, identifier: IdentifierConfig) -> Result<(), EngineError> {
        self.parsers.reload(identifier)?;
        Ok(())
    }

    /// Process one project
    ///
    /// `default_release` is used when no release id can be detected in the
    /// data at all.
    ///
    /// # Errors
    /// - `EngineError::EmptyProject` for a blank project code
    /// - `EngineError::Template` if the identifier template does not compile
    ///
    /// History write failures are not errors; they are listed in
    /// [`ProjectReport::persistence_failures`].
    pub fn process_project(
        &self,
        project: &str,
        data: &ProjectData,
        default_release: Option<&str>,
    ) -> Result<ProjectReport, EngineError> {
        let project = project.trim();
        if project.is_empty() {
            return Err(EngineError::EmptyProject);
        }

        let parser = self.parsers.get()?;
        let matcher = ReleaseMatcher::new(&parser);
        let groups = matcher.group(data);
        let releases = detect_releases(&groups, default_release);
        let index = self.history.load_index(project);
        let timestamp = (self.clock)();

        tracing::info!(
            project,
            plans = data.plans.len(),
            runs = data.runs.len(),
            releases = releases.len(),
            unmatched_plans = groups.unmatched_plans,
            untagged_runs = groups.untagged_runs,
            "processing project"
        );

        let mut report = ProjectReport::new(project);
        report.unmatched_plans = groups.unmatched_plans;
        report.untagged_runs = groups.untagged_runs;
        for release in &releases {
            self.process_release(project, release, data, &matcher, &index, timestamp, &mut report)?;
        }

        tracing::info!(
            project,
            computed = report.releases_in(ReleaseStage::Persisted).len(),
            frozen = report.releases_in(ReleaseStage::Frozen).len(),
            dropped = report.dropped.len(),
            failures = report.persistence_failures.len(),
            "project done"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_release(
        &self,
        project: &str,
        release: &str,
        data: &ProjectData,
        matcher: &ReleaseMatcher<'_>,
        index: &HistoryIndex,
        timestamp: DateTime<Utc>,
        report: &mut ProjectReport,
    ) -> Result<(), EngineError> {
        let mut tracker = StageTracker::new();
        let decision = index.decide(release);

        if !decision.should_process() {
            tracker.advance(ReleaseStage::Frozen)?;
            tracing::debug!(project, release, "release frozen, restoring from history");
            let restored: Vec<KpiDatum> = index
                .records(release)
                .iter()
                .map(HistoryRecord::to_datum)
                .collect();
            report.rows.push(ReleaseSummaryRow::from_kpis(
                project,
                release,
                &restored,
                RowSource::History,
            ));
            report.outcomes.push(ReleaseOutcome {
                context: ReleaseContext::from_official_id(release).with_project_key(project),
                decision,
                stage: tracker.stage(),
            });
            return Ok(());
        }

        let slice = matcher.filter(data, release);
        let context = matcher.context(&slice).with_project_key(project);
        if slice.is_orphaned() {
            tracker.advance(ReleaseStage::Dropped)?;
            tracing::warn!(project, release, runs = slice.runs.len(), "release has runs but no plans, dropped");
            report.dropped.push(release.to_string());
            report.outcomes.push(ReleaseOutcome {
                context,
                decision,
                stage: tracker.stage(),
            });
            return Ok(());
        }
        tracker.advance(ReleaseStage::Filtered)?;

        let stats = RunStatistics::aggregate(slice.runs.iter().copied());
        tracker.advance(ReleaseStage::Aggregated)?;

        let input = KpiInput {
            project,
            release,
            plans: &slice.plans,
            stats: &stats,
        };
        let kpis = self.registry.compute_all(&input);
        tracker.advance(ReleaseStage::Computed)?;
        tracing::debug!(
            project,
            release,
            ?decision,
            scope = slice.planned_scope(),
            executed = stats.executed,
            "release computed"
        );

        let records: Vec<HistoryRecord> = kpis
            .iter()
            .map(|d| {
                let trend = index.trend(release, &d.name, d.value.as_f64());
                HistoryRecord::from_datum(d, timestamp, trend)
            })
            .collect();

        match self.history.persist(project, release, &records) {
            Ok(()) => tracker.advance(ReleaseStage::Persisted)?,
            Err(e) => {
                tracing::error!(project, release, error = %e, "failed to persist KPI history");
                report.persistence_failures.push(PersistenceFailure {
                    release: release.to_string(),
                    error: e.to_string(),
                });
                tracker.advance(ReleaseStage::Frozen)?;
            }
        }

        report.rows.push(ReleaseSummaryRow::from_kpis(
            project,
            release,
            &kpis,
            RowSource::Computed,
        ));
        report.kpis.extend(kpis);
        report.outcomes.push(ReleaseOutcome {
            context,
            decision,
            stage: tracker.stage(),
        });
        Ok(())
    }

    /// Process projects one after another
    ///
    /// A failing project is recorded and the batch moves on.
    ///
    /// # Errors
    /// Only if the identifier template does not compile, since that would
    /// fail every project the same way
    pub fn process_batch<'a, I>(
        &self,
        projects: I,
        default_release: Option<&str>,
    ) -> Result<BatchReport, EngineError>
    where
        I: IntoIterator<Item = (&'a str, &'a ProjectData)>,
    {
        self.parsers.get()?;

        let mut batch = BatchReport::default();
        for (project, data) in projects {
            match self.process_project(project, data, default_release) {
                Ok(report) => batch.reports.push(report),
                Err(error) => {
                    tracing::error!(project, error = %error, "project failed");
                    batch.failures.push(ProjectFailure {
                        project: project.to_string(),
                        error,
                    });
                }
            }
        }
        Ok(batch)
    }
}

impl<S> std::fmt::Debug for KpiEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KpiEngine")
            .field("parsers", &self.parsers.stats())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Grouped releases plus dropped ones, or the default when there are none
fn detect_releases(groups: &ReleaseGroups<'_>, default_release: Option<&str>) -> BTreeSet<String> {
    let mut releases: BTreeSet<String> = groups
        .release_ids()
        .map(str::to_string)
        .chain(groups.dropped.iter().cloned())
        .collect();
    if releases.is_empty() {
        if let Some(id) = default_release.map(normalize_release_id).filter(|id| !id.is_empty()) {
            tracing::debug!(release = %id, "no release detected, using default");
            releases.insert(id);
        }
    }
    releases
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use qakpi_history::MemoryHistoryStore;
    use qakpi_metrics::names;
    use qakpi_release::{PlanRecord, RunCounters, RunRecord};

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn engine() -> KpiEngine<MemoryHistoryStore> {
        KpiEngine::new(IdentifierConfig::default(), MemoryHistoryStore::new()).with_clock(fixed_clock)
    }

    fn run(id: &str, release: &str, passed: u64, failed: u64) -> RunRecord {
        RunRecord::new(
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

    #[test]
    fn computes_and_persists_new_release() {
        let engine = engine();
        let data = ProjectData::new(
            vec![PlanRecord::new("p1", "Release 1.0_QA", 10)],
            vec![run("r1", "1.0_QA", 8, 2)],
        );

        let report = engine.process_project("WEB", &data, None).unwrap();
        assert_eq!(report.releases_in(ReleaseStage::Persisted), vec!["1.0_QA"]);
        assert_eq!(report.outcomes[0].decision, ProcessDecision::NoHistory);
        assert_eq!(report.kpis.len(), 7);

        let row = report.row("1.0_QA").unwrap();
        assert_eq!(row.coverage_pct, 100.0);
        assert_eq!(row.passed_pct, Some(80.0));
        assert_eq!(row.source, RowSource::Computed);

        let stored = engine.store().records("WEB", "1.0_QA").unwrap();
        assert_eq!(stored.len(), 7);
        assert_eq!(stored[0].timestamp, fixed_clock());
    }

    #[test]
    fn runs_without_plans_are_dropped() {
        let engine = engine();
        let data = ProjectData::new(
            vec![PlanRecord::new("p1", "Release 1.0_QA", 10)],
            vec![run("r1", "1.0_QA", 1, 0), run("r2", "2.0_UAT", 5, 5)],
        );

        let report = engine.process_project("WEB", &data, None).unwrap();
        assert_eq!(report.dropped, vec!["2.0_UAT".to_string()]);
        assert_eq!(report.unmatched_plans, 0);
        assert_eq!(report.untagged_runs, 0);
        assert_eq!(report.releases_in(ReleaseStage::Dropped), vec!["2.0_UAT"]);
        assert!(report.row("2.0_UAT").is_none());
        assert!(engine.store().records("WEB", "2.0_UAT").is_none());
    }

    #[test]
    fn unmatched_records_are_counted() {
        let engine = engine();
        let mut untagged = run("r2", "-", 3, 0);
        untagged.release = None;
        let data = ProjectData::new(
            vec![
                PlanRecord::new("p1", "Release 1.0_QA", 10),
                PlanRecord::new("p2", "team offsite", 2),
            ],
            vec![run("r1", "1.0_QA", 4, 1), untagged],
        );

        let report = engine.process_project("WEB", &data, None).unwrap();
        assert_eq!(report.unmatched_plans, 1);
        assert_eq!(report.untagged_runs, 1);
        assert_eq!(report.row("1.0_QA").unwrap().planned_scope, 10);
        assert_eq!(report.row("1.0_QA").unwrap().executed, 5);
    }

    #[test]
    fn default_release_when_nothing_detected() {
        let engine = engine();
        let data = ProjectData::new(vec![PlanRecord::new("p1", "weekly notes", 4)], vec![]);

        let report = engine.process_project("WEB", &data, Some(" 5.0_prod ")).unwrap();
        assert_eq!(report.unmatched_plans, 1);
        let row = report.row("5.0_PROD").unwrap();
        assert_eq!(row.planned_scope, 0);
        assert_eq!(row.passed_pct, None);

        let empty = engine.process_project("API", &ProjectData::default(), None).unwrap();
        assert!(empty.outcomes.is_empty());
    }

    #[test]
    fn trend_against_previous_release() {
        let engine = engine();
        let first = ProjectData::new(
            vec![PlanRecord::new("p1", "Release 1.0_QA", 10)],
            vec![run("r1", "1.0_QA", 5, 5)],
        );
        engine.process_project("WEB", &first, None).unwrap();

        let second = ProjectData::new(
            vec![PlanRecord::new("p2", "Release 2.0_QA", 10)],
            vec![run("r2", "2.0_QA", 9, 1)],
        );
        let report = engine.process_project("WEB", &second, None).unwrap();
        assert_eq!(report.outcomes[0].decision, ProcessDecision::UnseenRelease);

        let stored = engine.store().records("WEB", "2.0_QA").unwrap();
        let passed = stored.iter().find(|r| r.kpi == names::PASSED_PCT).unwrap();
        assert_eq!(passed.details.trend, qakpi_history::Trend::Up);
    }

    #[test]
    fn oversized_counters_do_not_abort_the_project() {
        let engine = engine();
        let data = ProjectData::from_value(&serde_json::json!({
            "plan": [{ "id": 1, "title": "Release 1.0_QA", "caseCount": 1e30 }],
            "run": [
                { "id": 1, "release": "1.0_QA", "passed": 1e20, "failed": 1 },
                { "id": 2, "release": "1.0_QA", "passed": 1e20 }
            ]
        }));

        let report = engine.process_project("WEB", &data, None).unwrap();
        let row = report.row("1.0_QA").unwrap();
        assert_eq!(row.coverage_pct, 100.0);
        assert_eq!(row.passed_pct, Some(100.0));
        assert_eq!(row.failed_pct, Some(0.0));
    }

    #[test]
    fn blank_project_is_rejected() {
        let err = engine().process_project("  ", &ProjectData::default(), None).unwrap_err();
        assert!(matches!(err, EngineError::EmptyProject));
    }

    #[test]
    fn bad_template_fails_batch_up_front() {
        let engine = KpiEngine::new(
            IdentifierConfig::new().with_template("${version}${environment}"),
            MemoryHistoryStore::new(),
        );
        let data = ProjectData::default();
        assert!(matches!(
            engine.process_batch([("WEB", &data)], None),
            Err(EngineError::Template(_))
        ));
    }

    #[test]
    fn reload_keeps_old_parser_on_error() {
        let engine = engine();
        assert!(engine
            .reload_identifier(IdentifierConfig::new().with_template("${version}"))
            .is_err());
        assert!(engine
            .reload_identifier(IdentifierConfig::new().with_template("${environment}-${version}"))
            .is_ok());

        let data = ProjectData::new(vec![PlanRecord::new("p1", "Go QA-3.1", 2)], vec![]);
        let report = engine.process_project("WEB", &data, None).unwrap();
        assert!(report.row("3.1_QA").is_some());
        assert!(format!("{engine:?}").contains("KpiEngine"));
    }
}
