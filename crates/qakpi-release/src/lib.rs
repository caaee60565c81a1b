//! QAKPI Release Identification
//!
//! Turns free-text plan titles into canonical release ids and buckets raw
//! test-management records by release.
//!
//! # Overview
//!
//! - **ReleaseTemplate**: `${token}` + literal template, compiled once into a
//!   pattern and an ordered token list
//! - **ReleaseIdentifierParser**: validates matches against allow-lists and
//!   the version rule, producing [`ParsedIdentifier`]s
//! - **ParserCache**: lazily compiled, reloadable parser state
//! - **ReleaseMatcher**: groups plans and runs by official release id
//!
//! # Example
//!
//! ```rust
//! use qakpi_release::{IdentifierConfig, ParserCache};
//!
//! let cache = ParserCache::new(IdentifierConfig::default());
//! let parser = cache.get().unwrap();
//!
//! let parsed = parser.parse("Release 3.3.0_STAGE kickoff").unwrap();
//! assert_eq!(parsed.official_id(), "3.3.0_STAGE");
//! assert!(parser.parse("weekly sync notes").is_none());
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod identifier;
pub mod matcher;
pub mod records;
pub mod template;

// Re-exports
pub use cache::{CacheStats, ParserCache};
pub use config::{IdentifierConfig, ENVIRONMENT_TOKEN, VERSION_TOKEN};
pub use context::{normalize_release_id, ReleaseContext};
pub use error::TemplateError;
pub use identifier::{ParsedIdentifier, ReleaseIdentifierParser};
pub use matcher::{ReleaseGroups, ReleaseMatcher, ReleaseSlice};
pub use records::{PlanRecord, ProjectData, RunCounters, RunRecord};
pub use template::{CompiledTemplate, ReleaseTemplate, TemplateSegment};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for release identification
    pub use crate::{
        IdentifierConfig, ParsedIdentifier, ParserCache, PlanRecord, ProjectData, ReleaseContext,
        ReleaseIdentifierParser, ReleaseMatcher, ReleaseSlice, RunCounters, RunRecord,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
