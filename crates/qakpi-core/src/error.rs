//! Error types for the KPI engine
//!
//! Provides error handling for:
//! - Configuration loading and validation
//! - Template compilation surfaced at engine start
//! - History persistence failures
//! - Release stage transitions

use crate::stage::ReleaseStage;
use qakpi_history::HistoryError;
use qakpi_release::TemplateError;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file extension is not toml, yaml/yml or json
    #[error("unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    /// Config file did not parse
    #[error("invalid config in {path}: {message}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Identifier template or version rule does not compile
    #[error("invalid identifier template: {0}")]
    Template(#[from] TemplateError),

    /// History base directory is blank
    #[error("history base directory must not be empty")]
    EmptyHistoryDir,
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Identifier template does not compile
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration problem
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// History store failure
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// Project code is blank
    #[error("project code must not be empty")]
    EmptyProject,

    /// Illegal release stage transition
    #[error("illegal release stage transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current stage
        from: ReleaseStage,
        /// Requested stage
        to: ReleaseStage,
    },
}

impl EngineError {
    /// Whether other projects in a batch can still be processed
    ///
    /// Template and configuration errors affect every project; the rest are
    /// local to one project.
    #[inline]
    #[must_use]
    pub fn is_project_local(&self) -> bool {
        !matches!(self, Self::Template(_) | Self::Config(_))
    }
}
