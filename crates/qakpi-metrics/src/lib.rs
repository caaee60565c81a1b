//! QAKPI Metrics
//!
//! Pure KPI computation for one release: run statistics aggregation, the
//! calculator trait and its default implementations, and the summary row
//! shape used by the consolidated panel.
//!
//! # Overview
//!
//! - **RunStatistics**: counters summed across a release's runs
//! - **KpiCalculator**: trait for one family of KPIs
//! - **KpiRegistry**: ordered calculators run for every release
//! - **ReleaseSummaryRow**: one denormalized row per (project, release)
//!
//! # Example
//!
//! ```rust
//! use qakpi_metrics::{KpiInput, KpiRegistry, RunStatistics};
//! use qakpi_release::{PlanRecord, RunCounters, RunRecord};
//!
//! let plan = PlanRecord::new("p1", "Release 1.0_QA", 50);
//! let run = RunRecord::new("r1", "1.0_QA", RunCounters {
//!     passed: 20,
//!     failed: 5,
//!     untested: 25,
//!     total: 50,
//!     ..RunCounters::default()
//! });
//!
//! let stats = RunStatistics::aggregate([&run]);
//! let plans = [&plan];
//! let input = KpiInput { project: "WEB", release: "1.0_QA", plans: &plans, stats: &stats };
//!
//! let kpis = KpiRegistry::with_defaults().compute_all(&input);
//! let coverage = kpis.iter().find(|k| k.name == "coverage_pct").unwrap();
//! assert_eq!(coverage.value.formatted(), "50%");
//! ```

#![warn(missing_docs)]

pub mod calculators;
pub mod kpi;
pub mod registry;
pub mod stats;
pub mod summary;

// Re-exports
pub use calculators::{
    coverage_percent, CoverageCalculator, KpiCalculator, KpiInput, ResultsMix,
    ResultsMixCalculator, ScopeCalculator,
};
pub use kpi::{names, KpiDatum, KpiValue};
pub use registry::KpiRegistry;
pub use stats::RunStatistics;
pub use summary::{clamp_percent, ReleaseSummaryRow, RowSource};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for KPI computation
    pub use crate::{
        KpiCalculator, KpiDatum, KpiInput, KpiRegistry, KpiValue, ReleaseSummaryRow, RowSource,
        RunStatistics,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
