//! Release identifier parsing
//!
//! Validates raw template matches into [`ParsedIdentifier`]s. Required tokens
//! (`version`, `environment`) fail hard: a bad value voids the parse. Every
//! other allow-listed token fails soft: a bad value becomes `None` and the
//! parse survives.

use crate::config::{IdentifierConfig, ENVIRONMENT_TOKEN, VERSION_TOKEN};
use crate::error::TemplateError;
use crate::template::{CompiledTemplate, RawMatch, ReleaseTemplate};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Successfully parsed release identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIdentifier {
    raw: String,
    tokens: IndexMap<String, Option<String>>,
    official_id: String,
}

impl ParsedIdentifier {
    /// Matched substring of the input
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `version_environment`
    #[inline]
    #[must_use]
    pub fn official_id(&self) -> &str {
        &self.official_id
    }

    /// All tokens in template order
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &IndexMap<String, Option<String>> {
        &self.tokens
    }

    /// Value of one token, if present and valid
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).and_then(|v| v.as_deref())
    }

    /// Parsed version
    #[must_use]
    pub fn version(&self) -> &str {
        self.get(VERSION_TOKEN).unwrap_or_default()
    }

    /// Parsed environment
    #[must_use]
    pub fn environment(&self) -> &str {
        self.get(ENVIRONMENT_TOKEN).unwrap_or_default()
    }
}

/// Compiled parser for one identifier configuration
#[derive(Debug, Clone)]
pub struct ReleaseIdentifierParser {
    template: CompiledTemplate,
    version_rule: Regex,
    allow_lists: HashMap<String, HashSet<String>>,
}

impl ReleaseIdentifierParser {
    /// Compile a parser from configuration
    ///
    /// # Errors
    /// - template structure errors
    /// - `MissingRequiredToken` if `version` or `environment` is absent
    /// - `InvalidVersionPattern` if the version rule does not compile
    pub fn new(config: &IdentifierConfig) -> Result<Self, TemplateError> {
        let template = ReleaseTemplate::parse(&config.template)?;
        for required in [VERSION_TOKEN, ENVIRONMENT_TOKEN] {
            if !template.has_token(required) {
                return Err(TemplateError::MissingRequiredToken {
                    name: required.to_string(),
                });
            }
        }

        let version_rule = RegexBuilder::new(&config.version_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| TemplateError::invalid_version_pattern(&config.version_pattern, &e))?;

        // empty lists mean "anything goes" and are left out entirely
        let allow_lists = config
            .allow_lists
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(token, values)| {
                let set = values.iter().map(|v| v.trim().to_uppercase()).collect();
                (token.clone(), set)
            })
            .collect();

        Ok(Self {
            template: template.compile()?,
            version_rule,
            allow_lists,
        })
    }

    /// Compiled template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    /// Extract the first valid identifier from free text
    ///
    /// Returns `None` for text with no match or whose matches all fail
    /// validation. Never guesses a partial identifier.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<ParsedIdentifier> {
        self.template
            .candidates(text)
            .find_map(|candidate| self.validate(&candidate))
    }

    /// Shorthand for `parse(text).official_id()`
    #[must_use]
    pub fn official_id(&self, text: &str) -> Option<String> {
        self.parse(text).map(|p| p.official_id)
    }

    fn validate(&self, candidate: &RawMatch<'_, '_>) -> Option<ParsedIdentifier> {
        let mut tokens = IndexMap::with_capacity(candidate.values.len());

        for (token, value) in &candidate.values {
            let required = IdentifierConfig::is_required(token);
            let value = normalize_token(value).filter(|v| self.allowed(token, v));

            if required && value.is_none() {
                tracing::trace!(token, raw = candidate.raw, "required token rejected");
                return None;
            }
            tokens.insert((*token).to_string(), value);
        }

        let version = tokens.get(VERSION_TOKEN)?.as_deref()?;
        let environment = tokens.get(ENVIRONMENT_TOKEN)?.as_deref()?;
        if !self.version_rule.is_match(version) {
            tracing::trace!(version, raw = candidate.raw, "version rejected by syntax rule");
            return None;
        }

        let official_id = format!("{version}_{environment}");
        Some(ParsedIdentifier {
            raw: candidate.raw.to_string(),
            tokens,
            official_id,
        })
    }

    fn allowed(&self, token: &str, value: &str) -> bool {
        self.allow_lists
            .get(token)
            .map_or(true, |allowed| allowed.contains(value))
    }
}

/// Trim, strip one pair of surrounding brackets and uppercase
fn normalize_token(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(trimmed)
        .trim();

    if inner.is_empty() {
        None
    } else {
        Some(inner.to_uppercase())
    }
}
