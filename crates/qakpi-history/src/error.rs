//! Error types for KPI history storage

use std::path::{Path, PathBuf};

/// Errors raised by history stores
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// IO error reading or writing a history location
    #[error("io error at {path}: {source}")]
    Io {
        /// Location involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded
    #[error("failed to encode history for {path}: {source}")]
    Encode {
        /// Target location
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A stored history file did not parse
    #[error("corrupt history file {path}: {source}")]
    Corrupt {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Project or release key is blank
    #[error("invalid history key: project={project:?} release={release:?}")]
    InvalidKey {
        /// Project code as given
        project: String,
        /// Release id as given
        release: String,
    },

    /// Store-specific failure
    #[error("history store error: {0}")]
    Store(String),
}

impl HistoryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid key error
    pub fn invalid_key(project: impl Into<String>, release: impl Into<String>) -> Self {
        Self::InvalidKey {
            project: project.into(),
            release: release.into(),
        }
    }

    /// Whether the caller may carry on as if no history existed
    ///
    /// Corrupt files and missing locations are recoverable; failed writes
    /// and bad keys are not.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Corrupt { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Encode { .. } | Self::InvalidKey { .. } | Self::Store(_) => false,
        }
    }

    /// Location involved, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::Encode { path, .. } | Self::Corrupt { path, .. } => {
                Some(path)
            }
            Self::InvalidKey { .. } | Self::Store(_) => None,
        }
    }
}
