//! Release identifier templates
//!
//! A template such as `${version}_${environment}` is split into ordered
//! [`TemplateSegment`]s and compiled into one regular expression plus the
//! ordered list of token names it captures.
//!
//! # Compilation rules
//!
//! - `${token}` becomes a capture group accepting either a bracketed
//!   free-form value (`[Sprint 12]`) or a bare alphanumeric token with
//!   optional inner dots (`3.3.0`)
//! - `_` and `-` in literals are interchangeable
//! - runs of whitespace match one or more whitespace characters
//! - any other literal character is matched verbatim (case-insensitive)
//! - the identifier must be followed by end-of-text or a non-alphanumeric
//!   character, so `3.3.0_STAGEX` never yields `STAGE`

use crate::error::TemplateError;
use regex::{Captures, Regex, RegexBuilder};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Group name wrapping the whole identifier
const IDENTIFIER_GROUP: &str = "identifier";

/// Value accepted for one placeholder
const TOKEN_VALUE: &str = r"\[[^\]]*\]|[A-Za-z0-9]+(?:\.[A-Za-z0-9]+)*";

/// One piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// `${name}` placeholder
    Token(String),
    /// Literal text between placeholders
    Literal(String),
}

/// Parsed (not yet compiled) release identifier template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTemplate {
    source: String,
    segments: Vec<TemplateSegment>,
}

impl ReleaseTemplate {
    /// Parse template text into segments
    ///
    /// # Errors
    /// Any structural problem listed on [`TemplateError`]
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments: Vec<TemplateSegment> = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while pos < source.len() {
            let rest = &source[pos..];

            if let Some(after) = rest.strip_prefix("${") {
                let close = after
                    .find('}')
                    .ok_or(TemplateError::UnterminatedPlaceholder { offset: pos })?;
                let name = after[..close].trim();

                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder { offset: pos });
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(TemplateError::InvalidTokenName {
                        name: name.to_string(),
                    });
                }

                if literal.is_empty() {
                    if let Some(TemplateSegment::Token(left)) = segments.last() {
                        return Err(TemplateError::AdjacentTokens {
                            left: left.clone(),
                            right: name.to_string(),
                        });
                    }
                } else {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal)));
                }

                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, TemplateSegment::Token(t) if t == name));
                if duplicate {
                    return Err(TemplateError::DuplicateToken {
                        name: name.to_string(),
                    });
                }

                segments.push(TemplateSegment::Token(name.to_string()));
                pos += 2 + close + 1;
            } else {
                let Some(ch) = rest.chars().next() else {
                    break;
                };
                literal.push(ch);
                pos += ch.len_utf8();
            }
        }

        if !literal.is_empty() {
            segments.push(TemplateSegment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original template text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Ordered segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Token names in template order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Token(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Check whether the template declares a token
    #[must_use]
    pub fn has_token(&self, name: &str) -> bool {
        self.tokens().any(|t| t == name)
    }

    /// Compile into a matcher
    ///
    /// # Errors
    /// `TemplateError::Pattern` if the composed expression does not build
    pub fn compile(&self) -> Result<CompiledTemplate, TemplateError> {
        let mut body = String::new();
        let mut tokens = Vec::new();

        for segment in &self.segments {
            match segment {
                TemplateSegment::Token(name) => {
                    body.push_str(&format!("(?P<t{}>{TOKEN_VALUE})", tokens.len()));
                    tokens.push(name.clone());
                }
                TemplateSegment::Literal(text) => body.push_str(&literal_pattern(text)),
            }
        }

        let pattern = format!("(?P<{IDENTIFIER_GROUP}>{body})(?:$|[^A-Za-z0-9])");
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        let group_names = (0..tokens.len()).map(|i| format!("t{i}")).collect();
        let leading_token = matches!(self.segments.first(), Some(TemplateSegment::Token(_)));

        Ok(CompiledTemplate {
            source: self.source.clone(),
            regex,
            tokens,
            group_names,
            leading_token,
        })
    }
}

impl FromStr for ReleaseTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ReleaseTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn literal_pattern(text: &str) -> String {
    let mut out = String::new();
    let mut in_whitespace = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push_str(r"\s+");
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        match ch {
            '_' | '-' => out.push_str("[_-]"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }

    out
}

/// Compiled template: composed pattern plus ordered token names
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    source: String,
    regex: Regex,
    tokens: Vec<String>,
    group_names: Vec<String>,
    leading_token: bool,
}

impl CompiledTemplate {
    /// Template text this was compiled from
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Composed regular expression
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Token names in capture order
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Every candidate identifier in `text`, leftmost first
    ///
    /// Candidates may overlap: after each one the search resumes one
    /// character past its start, so a rejected prefix such as `foo_` in
    /// `foo_3.3.0_STAGE` does not hide the real identifier behind it.
    #[must_use]
    pub fn candidates<'c, 't>(&'c self, text: &'t str) -> Candidates<'c, 't> {
        Candidates {
            template: self,
            text,
            start: 0,
        }
    }

    fn raw_match<'c, 't>(&'c self, caps: &Captures<'t>, whole: regex::Match<'t>) -> RawMatch<'c, 't> {
        let values = self
            .tokens
            .iter()
            .zip(&self.group_names)
            .filter_map(|(token, group)| caps.name(group).map(|m| (token.as_str(), m.as_str())))
            .collect();

        RawMatch {
            raw: whole.as_str(),
            values,
        }
    }
}

/// Unvalidated template match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch<'c, 't> {
    /// Matched identifier text (without the trailing boundary)
    pub raw: &'t str,
    /// Captured `(token, value)` pairs in template order
    pub values: Vec<(&'c str, &'t str)>,
}

/// Iterator over candidate matches
#[derive(Debug)]
pub struct Candidates<'c, 't> {
    template: &'c CompiledTemplate,
    text: &'t str,
    start: usize,
}

impl<'c, 't> Iterator for Candidates<'c, 't> {
    type Item = RawMatch<'c, 't>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.start < self.text.len() {
            let caps = self.template.regex.captures_at(self.text, self.start)?;
            let whole = caps.name(IDENTIFIER_GROUP)?;

            let step = self.text[whole.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            self.start = whole.start() + step;

            // a leading placeholder must start on a word boundary
            if self.template.leading_token && preceded_by_word_char(self.text, whole.start()) {
                continue;
            }

            return Some(self.template.raw_match(&caps, whole));
        }
        None
    }
}

fn preceded_by_word_char(text: &str, offset: usize) -> bool {
    text[..offset]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '.')
}
