//! KPI calculators
//!
//! Each calculator turns one release's plans and aggregated statistics into
//! KPI data. Calculators are pure: no side effects, no history access.

use crate::kpi::{names, KpiDatum, KpiValue};
use crate::stats::RunStatistics;
use qakpi_release::PlanRecord;

/// Everything a calculator may look at
#[derive(Debug, Clone, Copy)]
pub struct KpiInput<'a> {
    /// Project code
    pub project: &'a str,
    /// Official release id
    pub release: &'a str,
    /// Plans grouped into the release
    pub plans: &'a [&'a PlanRecord],
    /// Aggregated run statistics
    pub stats: &'a RunStatistics,
}

impl KpiInput<'_> {
    /// Sum of declared case counts across the release's plans
    #[must_use]
    pub fn planned_scope(&self) -> u64 {
        self.plans.iter().map(|p| p.case_count).fold(0, u64::saturating_add)
    }

    fn datum(&self, name: &str, label: &str, value: KpiValue) -> KpiDatum {
        KpiDatum::new(name, label, value, self.project, self.release)
    }
}

/// Calculator trait
///
/// Implement this trait to add a KPI; register it with
/// [`KpiRegistry`](crate::registry::KpiRegistry).
pub trait KpiCalculator: Send + Sync + 'static {
    /// Calculator name
    fn name(&self) -> &'static str;

    /// Produce KPI data for one release
    fn compute(&self, input: &KpiInput<'_>) -> Vec<KpiDatum>;
}

/// Planned scope and executed cases
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeCalculator;

impl KpiCalculator for ScopeCalculator {
    fn name(&self) -> &'static str {
        "scope"
    }

    fn compute(&self, input: &KpiInput<'_>) -> Vec<KpiDatum> {
        vec![
            input.datum(
                names::PLANNED_SCOPE,
                "Planned Scope",
                KpiValue::count(input.planned_scope()),
            ),
            input.datum(
                names::EXECUTED_CASES,
                "Executed Cases",
                KpiValue::count(input.stats.executed),
            ),
        ]
    }
}

/// Executed share of planned scope, whole percent
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageCalculator;

impl KpiCalculator for CoverageCalculator {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn compute(&self, input: &KpiInput<'_>) -> Vec<KpiDatum> {
        let coverage = coverage_percent(input.stats.executed, input.planned_scope());
        vec![input.datum(names::COVERAGE_PCT, "Coverage", KpiValue::percent(coverage, 0))]
    }
}

/// Passed / failed / blocked / retest percentages
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsMixCalculator;

impl KpiCalculator for ResultsMixCalculator {
    fn name(&self) -> &'static str {
        "results_mix"
    }

    fn compute(&self, input: &KpiInput<'_>) -> Vec<KpiDatum> {
        let mix = ResultsMix::from_stats(input.stats);
        let value = |pct: Option<f64>| pct.map_or(KpiValue::NotApplicable, |v| KpiValue::percent(v, 2));

        vec![
            input.datum(names::PASSED_PCT, "Passed", value(mix.map(|m| m.passed))),
            input.datum(names::FAILED_PCT, "Failed", value(mix.map(|m| m.failed))),
            input.datum(names::BLOCKED_PCT, "Blocked", value(mix.map(|m| m.blocked))),
            input.datum(names::RETEST_PCT, "Retest", value(mix.map(|m| m.retest))),
        ]
    }
}

/// Coverage: `executed / planned * 100`, rounded, clamped to `[0, 100]`
///
/// Zero planned scope gives zero coverage whatever was executed.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn coverage_percent(executed: u64, planned_scope: u64) -> f64 {
    if planned_scope == 0 {
        return 0.0;
    }
    let pct = (executed as f64 / planned_scope as f64 * 100.0).round();
    pct.clamp(0.0, 100.0)
}

/// Results-mix percentages, two decimals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultsMix {
    /// Passed percentage
    pub passed: f64,
    /// Failed percentage
    pub failed: f64,
    /// Blocked + skipped percentage
    pub blocked: f64,
    /// Retest percentage
    pub retest: f64,
}

impl ResultsMix {
    /// Compute from statistics; `None` when there were no runs at all
    ///
    /// Values are computed in hundredths of a percent. If rounding pushes the
    /// sum past 100 the excess is taken from the largest share.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_stats(stats: &RunStatistics) -> Option<Self> {
        if !stats.has_runs() {
            return None;
        }

        let base = stats.results_base();
        let counts = [
            stats.passed,
            stats.failed,
            stats.blocked_including_skipped(),
            stats.retest,
        ];

        let mut hundredths = [0u64; 4];
        if base > 0 {
            for (slot, count) in hundredths.iter_mut().zip(counts) {
                *slot = (count as f64 * 10_000.0 / base as f64).round() as u64;
            }
            let sum: u64 = hundredths.iter().sum();
            if sum > 10_000 {
                if let Some(largest) = hundredths.iter_mut().max() {
                    *largest -= sum - 10_000;
                }
            }
        }

        let pct = |h: u64| h as f64 / 100.0;
        Some(Self {
            passed: pct(hundredths[0]),
            failed: pct(hundredths[1]),
            blocked: pct(hundredths[2]),
            retest: pct(hundredths[3]),
        })
    }

    /// Sum of the four shares
    #[must_use]
    pub fn total(&self) -> f64 {
        self.passed + self.failed + self.blocked + self.retest
    }
}
