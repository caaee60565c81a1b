//! KPI bound properties and worked release scenarios.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use qakpi_metrics::{
    coverage_percent, names, KpiInput, KpiRegistry, KpiValue, ReleaseSummaryRow, ResultsMix,
    RowSource, RunStatistics,
};
use qakpi_release::{PlanRecord, RunCounters, RunRecord};

fn counters() -> impl Strategy<Value = RunCounters> {
    (0u64..500, 0u64..500, 0u64..500, 0u64..500, 0u64..500, 0u64..500).prop_map(
        |(passed, failed, blocked, skipped, retest, untested)| RunCounters {
            passed,
            failed,
            blocked,
            skipped,
            retest,
            untested,
            total: 0,
        },
    )
}

fn runs() -> impl Strategy<Value = Vec<RunRecord>> {
    proptest::collection::vec(counters(), 0..6).prop_map(|all| {
        all.into_iter()
            .enumerate()
            .map(|(i, c)| RunRecord::new(format!("r{i}"), "1.0_QA", c))
            .collect()
    })
}

proptest! {
    #[test]
    fn coverage_is_a_bounded_percentage(executed in 0u64..10_000, planned in 0u64..10_000) {
        let pct = coverage_percent(executed, planned);
        prop_assert!((0.0..=100.0).contains(&pct));
        prop_assert_eq!(pct.fract(), 0.0);
        if planned == 0 {
            prop_assert_eq!(pct, 0.0);
        }
    }

    #[test]
    fn results_mix_is_bounded(runs in runs()) {
        let stats = RunStatistics::aggregate(&runs);
        match ResultsMix::from_stats(&stats) {
            None => prop_assert!(runs.is_empty()),
            Some(mix) => {
                for pct in [mix.passed, mix.failed, mix.blocked, mix.retest] {
                    prop_assert!((0.0..=100.0).contains(&pct));
                }
                prop_assert!(mix.total() <= 100.0 + 1e-9, "sum {}", mix.total());
            }
        }
    }

    #[test]
    fn executed_never_exceeds_total(runs in runs()) {
        let stats = RunStatistics::aggregate(&runs);
        prop_assert!(stats.executed <= stats.total);
        prop_assert_eq!(stats.run_count, runs.len() as u64);
    }
}

fn release_kpis(plans: &[&PlanRecord], runs: &[RunRecord]) -> Vec<qakpi_metrics::KpiDatum> {
    let stats = RunStatistics::aggregate(runs);
    let input = KpiInput {
        project: "WEB",
        release: "1.0_QA",
        plans,
        stats: &stats,
    };
    KpiRegistry::with_defaults().compute_all(&input)
}

fn value_of(kpis: &[qakpi_metrics::KpiDatum], name: &str) -> KpiValue {
    kpis.iter()
        .find(|d| d.name == name)
        .map(|d| d.value)
        .unwrap_or_else(|| panic!("missing {name}"))
}

#[test]
fn one_run_eighty_twenty() {
    let plan = PlanRecord::new("p1", "Release 1.0_QA", 10);
    let run = RunRecord::new(
        "r1",
        "1.0_QA",
        RunCounters {
            passed: 8,
            failed: 2,
            total: 10,
            ..RunCounters::default()
        },
    );

    let kpis = release_kpis(&[&plan], &[run]);
    assert_eq!(value_of(&kpis, names::PASSED_PCT).formatted(), "80.00%");
    assert_eq!(value_of(&kpis, names::FAILED_PCT).formatted(), "20.00%");
    assert_eq!(value_of(&kpis, names::BLOCKED_PCT).formatted(), "0.00%");
    assert_eq!(value_of(&kpis, names::RETEST_PCT).formatted(), "0.00%");
}

#[test]
fn half_the_scope_executed() {
    let p1 = PlanRecord::new("p1", "Release 1.0_QA part one", 30);
    let p2 = PlanRecord::new("p2", "Release 1.0_QA part two", 20);
    let run = RunRecord::new(
        "r1",
        "1.0_QA",
        RunCounters {
            passed: 20,
            failed: 5,
            untested: 25,
            total: 50,
            ..RunCounters::default()
        },
    );

    let kpis = release_kpis(&[&p1, &p2], &[run]);
    assert_eq!(value_of(&kpis, names::PLANNED_SCOPE), KpiValue::count(50));
    assert_eq!(value_of(&kpis, names::EXECUTED_CASES), KpiValue::count(25));
    assert_eq!(value_of(&kpis, names::COVERAGE_PCT).formatted(), "50%");

    let row = ReleaseSummaryRow::from_kpis("WEB", "1.0_QA", &kpis, RowSource::Computed);
    assert_eq!(row.planned_scope, 50);
    assert_eq!(row.coverage_pct, 50.0);
    assert_eq!(row.passed_pct, Some(80.0));
}

#[test]
fn planned_release_without_runs() {
    let plan = PlanRecord::new("p1", "Release 1.0_QA", 40);
    let kpis = release_kpis(&[&plan], &[]);

    assert_eq!(value_of(&kpis, names::COVERAGE_PCT), KpiValue::percent(0.0, 0));
    assert_eq!(value_of(&kpis, names::PASSED_PCT), KpiValue::NotApplicable);

    let row = ReleaseSummaryRow::from_kpis("WEB", "1.0_QA", &kpis, RowSource::Computed);
    assert_eq!(row.planned_scope, 40);
    assert!(!row.has_results());
}
