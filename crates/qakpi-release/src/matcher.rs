//! Release matcher and grouper
//!
//! Buckets raw plans and runs into releases.
//!
//! # Rules
//!
//! - A plan with a release tag belongs to that tag's release. The tag wins
//!   over anything in the title.
//! - An untagged plan belongs to the release parsed from its title. When
//!   filtering for a given id, an untagged plan whose title does not parse
//!   but contains the id as a standalone token also matches (older records
//!   predate the parser).
//! - A run belongs only to the release named by its tag. Runs are never
//!   matched by title.
//! - A release with runs but no plan is dropped: there is no scope to
//!   measure coverage against.

use crate::context::{normalize_release_id, ReleaseContext};
use crate::identifier::ReleaseIdentifierParser;
use crate::records::{PlanRecord, ProjectData, RunRecord};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Plans and runs of one release, borrowed from the project data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSlice<'d> {
    /// Release id
    pub release_id: String,
    /// Plans of the release
    pub plans: Vec<&'d PlanRecord>,
    /// Runs of the release
    pub runs: Vec<&'d RunRecord>,
}

impl ReleaseSlice<'_> {
    /// Sum of declared case counts
    #[must_use]
    pub fn planned_scope(&self) -> u64 {
        self.plans.iter().map(|p| p.case_count).fold(0, u64::saturating_add)
    }

    /// Runs exist but no plan does
    #[inline]
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.plans.is_empty() && !self.runs.is_empty()
    }
}

/// Result of grouping a whole project
#[derive(Debug, Clone, Default)]
pub struct ReleaseGroups<'d> {
    /// Release id → plans, in first-seen order
    pub plans: IndexMap<String, Vec<&'d PlanRecord>>,
    /// Release id → runs, only for releases that have plans
    pub runs: IndexMap<String, Vec<&'d RunRecord>>,
    /// Release ids that had runs but no plan
    pub dropped: Vec<String>,
    /// Plans with neither a tag nor a parseable title
    pub unmatched_plans: usize,
    /// Runs without a release tag
    pub untagged_runs: usize,
}

impl ReleaseGroups<'_> {
    /// Release ids that survived grouping
    pub fn release_ids(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }
}

/// Assigns plans and runs to releases
#[derive(Debug, Clone, Copy)]
pub struct ReleaseMatcher<'p> {
    parser: &'p ReleaseIdentifierParser,
}

impl<'p> ReleaseMatcher<'p> {
    /// Create matcher around a compiled parser
    #[inline]
    #[must_use]
    pub fn new(parser: &'p ReleaseIdentifierParser) -> Self {
        Self { parser }
    }

    /// Release a plan belongs to: its tag, else the id parsed from its title
    #[must_use]
    pub fn plan_release(&self, plan: &PlanRecord) -> Option<String> {
        match plan.release.as_deref() {
            Some(tag) => Some(normalize_release_id(tag)),
            None => self.parser.official_id(&plan.title),
        }
    }

    /// Release a run belongs to: its tag only
    #[must_use]
    pub fn run_release(&self, run: &RunRecord) -> Option<String> {
        run.release.as_deref().map(normalize_release_id)
    }

    /// Whether a plan belongs to `release_id`
    #[must_use]
    pub fn plan_matches(&self, plan: &PlanRecord, release_id: &str) -> bool {
        let release_id = normalize_release_id(release_id);
        if let Some(tag) = plan.release.as_deref() {
            return normalize_release_id(tag) == release_id;
        }

        match self.parser.official_id(&plan.title) {
            Some(parsed) => parsed == release_id,
            None => contains_token(&plan.title.to_uppercase(), &release_id),
        }
    }

    /// Whether a run belongs to `release_id`
    #[must_use]
    pub fn run_matches(&self, run: &RunRecord, release_id: &str) -> bool {
        self.run_release(run).as_deref() == Some(normalize_release_id(release_id).as_str())
    }

    /// Every distinct release id named by the project's plans and runs
    #[must_use]
    pub fn detect(&self, data: &ProjectData) -> BTreeSet<String> {
        data.plans
            .iter()
            .filter_map(|p| self.plan_release(p))
            .chain(data.runs.iter().filter_map(|r| self.run_release(r)))
            .collect()
    }

    /// Bucket the whole project by release
    #[must_use]
    pub fn group<'d>(&self, data: &'d ProjectData) -> ReleaseGroups<'d> {
        let mut groups = ReleaseGroups::default();

        for plan in &data.plans {
            match self.plan_release(plan) {
                Some(id) => groups.plans.entry(id).or_default().push(plan),
                None => groups.unmatched_plans += 1,
            }
        }

        let mut orphan_runs: IndexMap<String, usize> = IndexMap::new();
        for run in &data.runs {
            match self.run_release(run) {
                Some(id) if groups.plans.contains_key(&id) => {
                    groups.runs.entry(id).or_default().push(run);
                }
                Some(id) => *orphan_runs.entry(id).or_default() += 1,
                None => groups.untagged_runs += 1,
            }
        }

        for (id, count) in orphan_runs {
            tracing::debug!(release = %id, runs = count, "dropping release with runs but no plan");
            groups.dropped.push(id);
        }

        groups
    }

    /// Plans and runs belonging to one release
    #[must_use]
    pub fn filter<'d>(&self, data: &'d ProjectData, release_id: &str) -> ReleaseSlice<'d> {
        ReleaseSlice {
            release_id: normalize_release_id(release_id),
            plans: data
                .plans
                .iter()
                .filter(|p| self.plan_matches(p, release_id))
                .collect(),
            runs: data
                .runs
                .iter()
                .filter(|r| self.run_matches(r, release_id))
                .collect(),
        }
    }

    /// Release context for a slice
    ///
    /// Metadata comes from the first plan whose title parses to this
    /// release; the date is the earliest plan date.
    #[must_use]
    pub fn context(&self, slice: &ReleaseSlice<'_>) -> ReleaseContext {
        let parsed = slice.plans.iter().find_map(|plan| {
            self.parser
                .parse(&plan.title)
                .filter(|p| p.official_id() == slice.release_id)
                .map(|p| (p, plan.title.clone()))
        });

        let mut context = match &parsed {
            Some((p, _)) => ReleaseContext::from_parsed(p),
            None => ReleaseContext::from_official_id(&slice.release_id),
        };

        context.release_name = parsed
            .map(|(_, title)| title)
            .or_else(|| slice.plans.first().map(|p| p.title.clone()));
        context.date = slice.plans.iter().filter_map(|p| p.date.clone()).min();
        context
    }
}

/// `needle` occurs in `haystack` with no letter, digit or dot on either side
fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '.';
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentifierConfig;
    use crate::records::RunCounters;

    fn parser() -> ReleaseIdentifierParser {
        ReleaseIdentifierParser::new(&IdentifierConfig::default()).unwrap()
    }

    fn run(id: &str, release: &str) -> RunRecord {
        RunRecord::new(id, release, RunCounters::default())
    }

    fn sample() -> ProjectData {
        ProjectData::new(
            vec![
                PlanRecord::new("p1", "Release 1.0_QA regression", 10),
                PlanRecord::new("p2", "Release 1.0_QA smoke", 5).with_date("2024-02-01"),
                PlanRecord::new("p3", "Hotfix 2.0_PROD", 3).with_date("2024-03-01"),
                PlanRecord::new("p4", "misc housekeeping", 7),
            ],
            vec![run("r1", "1.0_qa"), run("r2", "2.0_PROD"), run("r3", "9.9_DEV")],
        )
    }

    #[test]
    fn detect_collects_plan_and_run_ids() {
        let parser = parser();
        let ids = ReleaseMatcher::new(&parser).detect(&sample());
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec!["1.0_QA", "2.0_PROD", "9.9_DEV"]
        );
    }

    #[test]
    fn group_drops_releases_without_plans() {
        let parser = parser();
        let data = sample();
        let groups = ReleaseMatcher::new(&parser).group(&data);

        assert_eq!(groups.release_ids().collect::<Vec<_>>(), vec!["1.0_QA", "2.0_PROD"]);
        assert_eq!(groups.plans["1.0_QA"].len(), 2);
        assert_eq!(groups.runs["1.0_QA"].len(), 1);
        assert_eq!(groups.dropped, vec!["9.9_DEV".to_string()]);
        assert_eq!(groups.unmatched_plans, 1);
    }

    #[test]
    fn release_with_plans_but_no_runs_is_kept() {
        let parser = parser();
        let data = ProjectData::new(vec![PlanRecord::new("p", "3.0_UAT", 4)], vec![]);
        let groups = ReleaseMatcher::new(&parser).group(&data);

        assert_eq!(groups.release_ids().collect::<Vec<_>>(), vec!["3.0_UAT"]);
        assert!(groups.runs.is_empty());
    }

    #[test]
    fn tag_wins_over_title() {
        let parser = parser();
        let matcher = ReleaseMatcher::new(&parser);
        let plan = PlanRecord::new("p", "Release 1.0_QA", 1).with_release("2.0_PROD");

        assert_eq!(matcher.plan_release(&plan).as_deref(), Some("2.0_PROD"));
        assert!(matcher.plan_matches(&plan, "2.0_PROD"));
        assert!(!matcher.plan_matches(&plan, "1.0_QA"));
    }

    #[test]
    fn untagged_title_contains_fallback() {
        let parser = parser();
        let matcher = ReleaseMatcher::new(&parser);
        // title does not parse (LEGACY is not an environment) but contains the id
        let plan = PlanRecord::new("p", "old plan for 1.0_legacy", 1);

        assert_eq!(matcher.plan_release(&plan), None);
        assert!(matcher.plan_matches(&plan, "1.0_LEGACY"));
    }

    #[test]
    fn sibling_versions_stay_apart() {
        let parser = parser();
        let matcher = ReleaseMatcher::new(&parser);
        let data = ProjectData::new(
            vec![
                PlanRecord::new("p1", "Release 1.0_QA", 10),
                PlanRecord::new("p2", "Release 1.1.0_QA", 40),
                PlanRecord::new("p3", "Release 11.0_QA", 5),
            ],
            vec![],
        );

        assert_eq!(matcher.filter(&data, "1.0_QA").planned_scope(), 10);
        assert_eq!(matcher.filter(&data, "1.1.0_QA").planned_scope(), 40);
        assert_eq!(matcher.filter(&data, "11.0_QA").planned_scope(), 5);
        assert_eq!(matcher.filter(&data, "QA").planned_scope(), 0);
    }

    #[test]
    fn title_fallback_needs_token_boundaries() {
        let parser = parser();
        let matcher = ReleaseMatcher::new(&parser);
        let plan = PlanRecord::new("p", "notes on v21.0_legacy build", 1);

        assert!(!matcher.plan_matches(&plan, "1.0_LEGACY"));
        assert!(matcher.plan_matches(&PlanRecord::new("p", "(1.0_legacy)", 1), "1.0_LEGACY"));
        assert!(!matcher.plan_matches(&plan, ""));
    }

    #[test]
    fn runs_match_only_by_tag() {
        let parser = parser();
        let matcher = ReleaseMatcher::new(&parser);
        let mut untagged = run("r", "x");
        untagged.release = None;

        assert!(matcher.run_matches(&run("r", " 1.0_qa "), "1.0_QA"));
        assert!(!matcher.run_matches(&untagged, "1.0_QA"));
    }

    #[test]
    fn filter_builds_slice() {
        let parser = parser();
        let data = sample();
        let slice = ReleaseMatcher::new(&parser).filter(&data, "1.0_qa");

        assert_eq!(slice.release_id, "1.0_QA");
        assert_eq!(slice.plans.len(), 2);
        assert_eq!(slice.runs.len(), 1);
        assert_eq!(slice.planned_scope(), 15);
        assert!(!slice.is_orphaned());
    }

    #[test]
    fn context_carries_title_and_earliest_date() {
        let parser = parser();
        let data = sample();
        let matcher = ReleaseMatcher::new(&parser);
        let context = matcher.context(&matcher.filter(&data, "1.0_QA"));

        assert_eq!(context.official_id(), "1.0_QA");
        assert_eq!(context.release_name.as_deref(), Some("Release 1.0_QA regression"));
        assert_eq!(context.date.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn orphan_slice() {
        let parser = parser();
        let data = sample();
        let slice = ReleaseMatcher::new(&parser).filter(&data, "9.9_DEV");
        assert!(slice.is_orphaned());
    }
}
