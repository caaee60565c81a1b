//! QAKPI History
//!
//! Persisted KPI snapshots and the policy deciding which releases are
//! recomputed.
//!
//! # Overview
//!
//! - **HistoryRecord**: one stored KPI value with label, display text and trend
//! - **HistoryStore**: persistence seam, with file-tree and in-memory stores
//! - **ReleaseOrdering**: how "newest release" is determined
//! - **HistoryIndex** / **HistoryCoordinator**: load a project's history and
//!   answer "process or freeze?" per release
//!
//! # Example
//!
//! ```rust
//! use qakpi_history::{HistoryCoordinator, MemoryHistoryStore, ProcessDecision};
//!
//! let coordinator = HistoryCoordinator::new(MemoryHistoryStore::new());
//! let index = coordinator.load_index("WEB");
//! assert_eq!(index.decide("3.3.0_STAGE"), ProcessDecision::NoHistory);
//! ```

#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod ordering;
pub mod record;
pub mod repository;

// Re-exports
pub use coordinator::{HistoryCoordinator, HistoryIndex, ProcessDecision};
pub use error::HistoryError;
pub use ordering::ReleaseOrdering;
pub use record::{HistoryDetails, HistoryRecord, Trend};
pub use repository::{
    encode_component, FileHistoryRepository, HistoryStore, MemoryHistoryStore,
    HISTORY_FILE_NAME,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for history handling
    pub use crate::{
        FileHistoryRepository, HistoryCoordinator, HistoryIndex, HistoryRecord, HistoryStore,
        MemoryHistoryStore, ProcessDecision, ReleaseOrdering, Trend,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
