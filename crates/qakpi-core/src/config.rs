//! Engine configuration
//!
//! Loaded from TOML, YAML or JSON (chosen by file extension). Every field
//! has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! [identifier]
//! template = "${version}_${environment}_${platform}"
//!
//! [identifier.allow_lists]
//! environment = ["QA", "UAT", "PROD"]
//!
//! [history]
//! base_dir = "history"
//! ordering = "natural"
//! ```

use crate::error::ConfigError;
use qakpi_history::ReleaseOrdering;
use qakpi_release::{IdentifierConfig, ReleaseIdentifierParser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default history directory
pub const DEFAULT_HISTORY_DIR: &str = "kpi_history";

/// History settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Root of the per-project history tree
    pub base_dir: PathBuf,
    /// How the newest release is chosen
    pub ordering: ReleaseOrdering,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_HISTORY_DIR),
            ordering: ReleaseOrdering::Lexical,
        }
    }
}

/// KPI engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Release identifier template, version rule and allow-lists
    pub identifier: IdentifierConfig,
    /// History storage
    pub history: HistoryConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With identifier configuration
    #[inline]
    #[must_use]
    pub fn with_identifier(mut self, identifier: IdentifierConfig) -> Self {
        self.identifier = identifier;
        self
    }

    /// With history base directory
    #[inline]
    #[must_use]
    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history.base_dir = dir.into();
        self
    }

    /// With release ordering
    #[inline]
    #[must_use]
    pub fn with_ordering(mut self, ordering: ReleaseOrdering) -> Self {
        self.history.ordering = ordering;
        self
    }

    /// Load from a `.toml`, `.yaml`/`.yml` or `.json` file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::UnsupportedFormat` for any other extension
    /// - `ConfigError::Parse` if the content does not parse
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config: Self = match extension.as_str() {
            "toml" => toml::from_str(&text).map_err(|e| ConfigError::parse_error(path, e))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&text).map_err(|e| ConfigError::parse_error(path, e))?
            }
            "json" => serde_json::from_str(&text).map_err(|e| ConfigError::parse_error(path, e))?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(path = %path.display(), template = %config.identifier.template, "loaded engine configuration");
        Ok(config)
    }

    /// Check the template compiles and the history directory is set
    ///
    /// # Errors
    /// The first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        ReleaseIdentifierParser::new(&self.identifier)?;
        if self.history.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyHistoryDir);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.base_dir, PathBuf::from(DEFAULT_HISTORY_DIR));
        assert_eq!(config.history.ordering, ReleaseOrdering::Lexical);
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "engine.toml",
            r#"
[identifier]
template = "${environment}-${version}"

[identifier.allow_lists]
environment = ["QA", "PROD"]

[history]
base_dir = "out/history"
ordering = "natural"
"#,
        );

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.identifier.template, "${environment}-${version}");
        assert_eq!(
            config.identifier.allow_lists.get("environment"),
            Some(&vec!["QA".to_string(), "PROD".to_string()])
        );
        assert_eq!(config.history.base_dir, PathBuf::from("out/history"));
        assert_eq!(config.history.ordering, ReleaseOrdering::Natural);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(&dir, "engine.yml", "history:\n  ordering: natural\n");
        let json = write(&dir, "engine.json", r#"{"identifier": {"template": "${version} ${environment}"}}"#);

        let from_yaml = EngineConfig::from_file(yaml).unwrap();
        assert_eq!(from_yaml.history.ordering, ReleaseOrdering::Natural);
        assert_eq!(from_yaml.identifier, IdentifierConfig::default());

        let from_json = EngineConfig::from_file(json).unwrap();
        assert_eq!(from_json.identifier.template, "${version} ${environment}");
    }

    #[test]
    fn rejects_unknown_extension_and_bad_content() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write(&dir, "engine.ini", "x=1");
        assert!(matches!(
            EngineConfig::from_file(ini),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
        ));

        let bad = write(&dir, "engine.json", "{ nope");
        assert!(matches!(EngineConfig::from_file(bad), Err(ConfigError::Parse { .. })));

        assert!(matches!(
            EngineConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn validate_catches_template_errors() {
        let config = EngineConfig::new()
            .with_identifier(IdentifierConfig::new().with_template("${version}"));
        assert!(matches!(config.validate(), Err(ConfigError::Template(_))));

        let config = EngineConfig::new().with_history_dir("");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyHistoryDir)));
    }
}
