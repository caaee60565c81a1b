//! Release context
//!
//! Semantic record for one release. Identity is the official id alone: two
//! contexts with the same `version_environment` are the same release no
//! matter what metadata they carry.

use crate::identifier::ParsedIdentifier;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Normalise a release id or tag for comparison
#[inline]
#[must_use]
pub fn normalize_release_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// One release and its optional metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseContext {
    official_id: String,
    /// Release version
    pub version: String,
    /// Target environment
    pub environment: String,
    /// Sprint label
    pub sprint: Option<String>,
    /// Platform
    pub platform: Option<String>,
    /// Language
    pub language: Option<String>,
    /// Test type
    pub test_type: Option<String>,
    /// Owning project key
    pub project_key: Option<String>,
    /// Human-readable release name
    pub release_name: Option<String>,
    /// Release date as supplied upstream
    pub date: Option<String>,
}

impl ReleaseContext {
    /// Create context from version and environment
    #[must_use]
    pub fn new(version: impl Into<String>, environment: impl Into<String>) -> Self {
        let version = version.into().trim().to_uppercase();
        let environment = environment.into().trim().to_uppercase();
        Self {
            official_id: format!("{version}_{environment}"),
            version,
            environment,
            sprint: None,
            platform: None,
            language: None,
            test_type: None,
            project_key: None,
            release_name: None,
            date: None,
        }
    }

    /// Build from a parsed identifier, carrying its metadata
    #[must_use]
    pub fn from_parsed(parsed: &ParsedIdentifier) -> Self {
        let mut context = Self::new(parsed.version(), parsed.environment());
        context.sprint = parsed.get("sprint").map(str::to_string);
        context.platform = parsed.get("platform").map(str::to_string);
        context.language = parsed.get("language").map(str::to_string);
        context.test_type = parsed.get("testType").map(str::to_string);
        context
    }

    /// Rebuild from an official id alone
    ///
    /// Ids without an underscore (e.g. a caller-supplied fallback) keep the
    /// whole id as version and an empty environment.
    #[must_use]
    pub fn from_official_id(id: &str) -> Self {
        let id = normalize_release_id(id);
        let (version, environment) = id.split_once('_').unwrap_or((id.as_str(), ""));
        let mut context = Self::new(version, environment);
        context.official_id = id;
        context
    }

    /// With project key
    #[inline]
    #[must_use]
    pub fn with_project_key(mut self, key: impl Into<String>) -> Self {
        self.project_key = Some(key.into());
        self
    }

    /// With release name
    #[inline]
    #[must_use]
    pub fn with_release_name(mut self, name: impl Into<String>) -> Self {
        self.release_name = Some(name.into());
        self
    }

    /// With date
    #[inline]
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// `version_environment`
    #[inline]
    #[must_use]
    pub fn official_id(&self) -> &str {
        &self.official_id
    }
}

impl PartialEq for ReleaseContext {
    fn eq(&self, other: &Self) -> bool {
        self.official_id == other.official_id
    }
}

impl Eq for ReleaseContext {}

impl Hash for ReleaseContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.official_id.hash(state);
    }
}

impl PartialOrd for ReleaseContext {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseContext {
    fn cmp(&self, other: &Self) -> Ordering {
        self.official_id.cmp(&other.official_id)
    }
}

impl Display for ReleaseContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.official_id)
    }
}
