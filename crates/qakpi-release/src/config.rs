//! Identifier configuration
//!
//! Everything the template compiler needs: the template itself, the version
//! syntax rule and one allow-list per token name. Token names are not
//! hard-coded beyond the two identity tokens, so a new mnemonic only needs a
//! template change and (optionally) an allow-list entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token carrying the release version
pub const VERSION_TOKEN: &str = "version";

/// Token carrying the target environment
pub const ENVIRONMENT_TOKEN: &str = "environment";

/// Tokens whose failure voids the whole parse
pub const REQUIRED_TOKENS: [&str; 2] = [VERSION_TOKEN, ENVIRONMENT_TOKEN];

/// Default template: `3.3.0_STAGE`
pub const DEFAULT_TEMPLATE: &str = "${version}_${environment}";

/// Default version rule: dotted numeric with optional `v` prefix
pub const DEFAULT_VERSION_PATTERN: &str = r"^[Vv]?\d+(\.\d+)*$";

/// Release identifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Template such as `${version}_${environment}_${platform}`
    pub template: String,
    /// Regular expression every parsed version must match
    pub version_pattern: String,
    /// Allowed values per token name (compared uppercased)
    pub allow_lists: BTreeMap<String, Vec<String>>,
}

impl IdentifierConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With template
    #[inline]
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// With version pattern
    #[inline]
    #[must_use]
    pub fn with_version_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.version_pattern = pattern.into();
        self
    }

    /// Replace the allow-list for one token
    #[must_use]
    pub fn with_allow_list<I, S>(mut self, token: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_lists
            .insert(token.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Drop the allow-list for one token (any value accepted)
    #[must_use]
    pub fn without_allow_list(mut self, token: &str) -> Self {
        self.allow_lists.remove(token);
        self
    }

    /// Check whether a token must be present and valid
    #[inline]
    #[must_use]
    pub fn is_required(token: &str) -> bool {
        REQUIRED_TOKENS.contains(&token)
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        let mut allow_lists = BTreeMap::new();
        allow_lists.insert(
            ENVIRONMENT_TOKEN.to_string(),
            to_strings(&["DEV", "QA", "SIT", "UAT", "STAGE", "PREPROD", "PROD"]),
        );
        allow_lists.insert(
            "platform".to_string(),
            to_strings(&["WEB", "ANDROID", "IOS", "API", "DESKTOP"]),
        );
        allow_lists.insert(
            "language".to_string(),
            to_strings(&["EN", "ES", "FR", "DE", "PT", "IT"]),
        );
        allow_lists.insert(
            "testType".to_string(),
            to_strings(&["REGRESSION", "SMOKE", "SANITY", "FUNCTIONAL", "E2E", "PERFORMANCE"]),
        );

        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            version_pattern: DEFAULT_VERSION_PATTERN.to_string(),
            allow_lists,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_environment_list() {
        let config = IdentifierConfig::default();
        assert_eq!(config.template, DEFAULT_TEMPLATE);
        assert!(config.allow_lists[ENVIRONMENT_TOKEN].contains(&"STAGE".to_string()));
    }

    #[test]
    fn builders_replace_fields() {
        let config = IdentifierConfig::new()
            .with_template("${environment}-${version}")
            .with_allow_list("environment", ["LAB"])
            .without_allow_list("platform");

        assert_eq!(config.template, "${environment}-${version}");
        assert_eq!(config.allow_lists["environment"], vec!["LAB".to_string()]);
        assert!(!config.allow_lists.contains_key("platform"));
    }

    #[test]
    fn required_tokens() {
        assert!(IdentifierConfig::is_required("version"));
        assert!(IdentifierConfig::is_required("environment"));
        assert!(!IdentifierConfig::is_required("platform"));
    }

    #[test]
    fn deserializes_partial_json() {
        let config: IdentifierConfig =
            serde_json::from_str(r#"{"template": "${version}.${environment}"}"#).unwrap();
        assert_eq!(config.template, "${version}.${environment}");
        assert_eq!(config.version_pattern, DEFAULT_VERSION_PATTERN);
    }
}
