//! QAKPI Core
//!
//! Release KPI engine. Groups a project's test plans and runs by release,
//! computes scope, coverage and results-mix KPIs, and keeps a per-release
//! history in which every release but the newest is frozen.
//!
//! # Overview
//!
//! - **EngineConfig**: identifier template, allow-lists, history location
//! - **KpiEngine**: per-project pipeline and batch driver
//! - **ReleaseStage**: validated per-release stage machine
//! - **telemetry**: tracing subscriber bootstrap
//!
//! # Example
//!
//! ```rust
//! use qakpi_core::prelude::*;
//! use qakpi_history::MemoryHistoryStore;
//! use qakpi_release::{PlanRecord, ProjectData, RunCounters, RunRecord};
//!
//! let engine = KpiEngine::new(EngineConfig::default().identifier, MemoryHistoryStore::new());
//! let data = ProjectData::new(
//!     vec![PlanRecord::new("p1", "Release 3.3.0_STAGE kickoff", 50)],
//!     vec![RunRecord::new("r1", "3.3.0_STAGE", RunCounters {
//!         passed: 20,
//!         failed: 5,
//!         untested: 25,
//!         total: 50,
//!         ..RunCounters::default()
//!     })],
//! );
//!
//! let report = engine.process_project("WEB", &data, None).unwrap();
//! let row = report.row("3.3.0_STAGE").unwrap();
//! assert_eq!(row.coverage_pct, 50.0);
//! assert_eq!(row.passed_pct, Some(80.0));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod stage;
pub mod telemetry;

// Re-exports
pub use config::{EngineConfig, HistoryConfig, DEFAULT_HISTORY_DIR};
pub use engine::{
    BatchReport, Clock, KpiEngine, PersistenceFailure, ProjectFailure, ProjectReport,
    ReleaseOutcome,
};
pub use error::{ConfigError, EngineError};
pub use stage::{allowed_transitions, validate_transition, ReleaseStage, StageTracker};
pub use telemetry::{init_test_tracing, init_tracing, LogFormat};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the engine
    pub use crate::{
        BatchReport, EngineConfig, EngineError, KpiEngine, ProjectReport, ReleaseOutcome,
        ReleaseStage,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
