//! Run statistics aggregation
//!
//! Pure reduction of a release's runs into one record. Raw counters are kept
//! exactly as summed; skipped cases are folded into blocked only when
//! percentages are computed.

use qakpi_release::RunRecord;
use serde::{Deserialize, Serialize};

/// Totals across every run of one release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Number of runs aggregated
    pub run_count: u64,
    /// Total cases
    pub total: u64,
    /// Executed cases (`total - untested`, never negative)
    pub executed: u64,
    /// Passed cases
    pub passed: u64,
    /// Failed cases
    pub failed: u64,
    /// Blocked cases (without skipped)
    pub blocked: u64,
    /// Skipped cases
    pub skipped: u64,
    /// Retest cases
    pub retest: u64,
    /// Untested cases
    pub untested: u64,
}

impl RunStatistics {
    /// Sum counters over runs
    pub fn aggregate<'a, I>(runs: I) -> Self
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        let mut stats = runs.into_iter().fold(Self::default(), |mut acc, run| {
            let counters = run.counters();
            acc.run_count += 1;
            acc.total = acc.total.saturating_add(counters.effective_total());
            acc.passed = acc.passed.saturating_add(counters.passed);
            acc.failed = acc.failed.saturating_add(counters.failed);
            acc.blocked = acc.blocked.saturating_add(counters.blocked);
            acc.skipped = acc.skipped.saturating_add(counters.skipped);
            acc.retest = acc.retest.saturating_add(counters.retest);
            acc.untested = acc.untested.saturating_add(counters.untested);
            acc
        });
        stats.executed = stats.total.saturating_sub(stats.untested);
        stats
    }

    /// Blocked count used for percentages (skipped folded in)
    #[inline]
    #[must_use]
    pub fn blocked_including_skipped(&self) -> u64 {
        self.blocked.saturating_add(self.skipped)
    }

    /// Denominator of the results mix
    #[inline]
    #[must_use]
    pub fn results_base(&self) -> u64 {
        [self.passed, self.failed, self.blocked_including_skipped(), self.retest]
            .into_iter()
            .fold(0, u64::saturating_add)
    }

    /// At least one run was aggregated
    #[inline]
    #[must_use]
    pub fn has_runs(&self) -> bool {
        self.run_count > 0
    }
}
