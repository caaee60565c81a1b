//! Lazily compiled, reloadable parser state
//!
//! The compiled template depends only on configuration, so it is built once
//! on first use and shared. `reload` swaps in a new configuration and
//! `reset` drops the compiled parser so the next `get` rebuilds it.

use crate::config::IdentifierConfig;
use crate::error::TemplateError;
use crate::identifier::ReleaseIdentifierParser;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the parser cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of times the template has been compiled
    pub compilations: u64,
    /// Whether a compiled parser is currently held
    pub is_compiled: bool,
}

/// Initialize-once holder for the compiled identifier parser
///
/// Lock order is always `compiled` then `config`.
#[derive(Debug)]
pub struct ParserCache {
    config: RwLock<IdentifierConfig>,
    compiled: RwLock<Option<Arc<ReleaseIdentifierParser>>>,
    compilations: AtomicU64,
}

impl ParserCache {
    /// Create cache for configuration (nothing compiled yet)
    #[inline]
    #[must_use]
    pub fn new(config: IdentifierConfig) -> Self {
        Self {
            config: RwLock::new(config),
            compiled: RwLock::new(None),
            compilations: AtomicU64::new(0),
        }
    }

    /// Get the compiled parser, compiling on first use
    ///
    /// # Errors
    /// Template compilation errors. Nothing is cached on failure.
    pub fn get(&self) -> Result<Arc<ReleaseIdentifierParser>, TemplateError> {
        if let Some(parser) = self.compiled.read().as_ref() {
            return Ok(Arc::clone(parser));
        }

        let mut slot = self.compiled.write();
        if let Some(parser) = slot.as_ref() {
            return Ok(Arc::clone(parser));
        }

        let config = self.config.read();
        let parser = Arc::new(ReleaseIdentifierParser::new(&config)?);
        self.compilations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(template = %config.template, "compiled release identifier template");

        *slot = Some(Arc::clone(&parser));
        Ok(parser)
    }

    /// Replace configuration and recompile immediately
    ///
    /// The previous parser stays in place if the new configuration does not
    /// compile.
    ///
    /// # Errors
    /// Template compilation errors for the new configuration
    pub fn reload(&self, config: IdentifierConfig) -> Result<Arc<ReleaseIdentifierParser>, TemplateError> {
        let parser = Arc::new(ReleaseIdentifierParser::new(&config)?);

        let mut slot = self.compiled.write();
        let mut current = self.config.write();
        tracing::info!(from = %current.template, to = %config.template, "reloaded release identifier template");
        *current = config;
        *slot = Some(Arc::clone(&parser));
        self.compilations.fetch_add(1, Ordering::Relaxed);

        Ok(parser)
    }

    /// Drop the compiled parser; the next `get` recompiles
    #[inline]
    pub fn reset(&self) {
        *self.compiled.write() = None;
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> IdentifierConfig {
        self.config.read().clone()
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            compilations: self.compilations.load(Ordering::Relaxed),
            is_compiled: self.compiled.read().is_some(),
        }
    }
}

impl Default for ParserCache {
    fn default() -> Self {
        Self::new(IdentifierConfig::default())
    }
}
