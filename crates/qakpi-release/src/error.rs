//! Error types for release identification
//!
//! Only template compilation can fail loudly. Matching free text against a
//! compiled template never errors: a miss is reported as `None`.

/// Errors raised while compiling a release identifier template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Template string is empty or whitespace
    #[error("release identifier template is empty")]
    Empty,

    /// `${` without a closing brace
    #[error("unterminated placeholder starting at offset {offset}")]
    UnterminatedPlaceholder { offset: usize },

    /// `${}` with nothing inside
    #[error("empty placeholder at offset {offset}")]
    EmptyPlaceholder { offset: usize },

    /// Placeholder name contains characters outside `[A-Za-z0-9_]`
    #[error("invalid placeholder name '{name}'")]
    InvalidTokenName { name: String },

    /// Same placeholder used twice
    #[error("placeholder '{name}' appears more than once")]
    DuplicateToken { name: String },

    /// Two placeholders with no literal separator between them
    #[error("placeholders '{left}' and '{right}' need a separator between them")]
    AdjacentTokens { left: String, right: String },

    /// Template lacks one of the identity tokens
    #[error("template must contain the '{name}' placeholder")]
    MissingRequiredToken { name: String },

    /// Version syntax rule is not a valid regular expression
    #[error("invalid version pattern '{pattern}': {message}")]
    InvalidVersionPattern { pattern: String, message: String },

    /// Composed pattern failed to build
    #[error("failed to build template pattern: {0}")]
    Pattern(String),
}

impl TemplateError {
    /// Create invalid version pattern error
    pub fn invalid_version_pattern(pattern: impl Into<String>, source: &regex::Error) -> Self {
        Self::InvalidVersionPattern {
            pattern: pattern.into(),
            message: source.to_string(),
        }
    }
}

impl From<regex::Error> for TemplateError {
    fn from(value: regex::Error) -> Self {
        Self::Pattern(value.to_string())
    }
}
