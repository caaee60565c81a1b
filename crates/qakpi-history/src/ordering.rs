//! Release ordering
//!
//! Decides which release id is "newest". Lexical order is only right when
//! ids sort like their chronology (zero-padded versions); `Natural` compares
//! digit runs numerically so `10.0_QA` sorts after `9.0_QA`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How release ids are ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOrdering {
    /// Plain string comparison
    #[default]
    Lexical,
    /// Digit runs compared as numbers, everything else as text
    Natural,
}

impl ReleaseOrdering {
    /// Compare two release ids
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexical => a.cmp(b),
            Self::Natural => natural_cmp(a, b),
        }
    }

    /// Greatest id under this ordering
    pub fn newest<'a, I>(self, ids: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().max_by(|a, b| self.compare(a, b))
    }
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (is_digits(l), is_digits(r)) {
                    (true, true) => cmp_numeric(l, r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

// Arbitrary length: strip leading zeros, then longer is larger.
fn cmp_numeric(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}

/// Alternating runs of digits and non-digits
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.bytes().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .bytes()
            .position(|b| b.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lexical_is_plain_string_order() {
        let ord = ReleaseOrdering::Lexical;
        assert_eq!(ord.compare("9.0_QA", "10.0_QA"), Ordering::Greater);
        assert_eq!(ord.newest(["R1", "R2"]), Some("R2"));
        assert_eq!(ord.newest(std::iter::empty()), None);
    }

    #[test]
    fn natural_compares_digit_runs() {
        let ord = ReleaseOrdering::Natural;
        assert_eq!(ord.compare("9.0_QA", "10.0_QA"), Ordering::Less);
        assert_eq!(ord.compare("3.10.0_QA", "3.9.2_QA"), Ordering::Greater);
        assert_eq!(ord.compare("V2_QA", "V10_QA"), Ordering::Less);
        assert_eq!(ord.newest(["3.9.0_QA", "3.10.0_QA", "3.2.0_QA"]), Some("3.10.0_QA"));
    }

    #[test]
    fn natural_breaks_ties_on_text() {
        let ord = ReleaseOrdering::Natural;
        assert_eq!(ord.compare("1.01_QA", "1.1_QA"), "1.01_QA".cmp("1.1_QA"));
        assert_eq!(ord.compare("1.0", "1.0_QA"), Ordering::Less);
        assert_eq!(ord.compare("1.0_QA", "1.0_QA"), Ordering::Equal);
    }

    #[test]
    fn ordering_deserializes_snake_case() {
        let ord: ReleaseOrdering = serde_json::from_str("\"natural\"").unwrap();
        assert_eq!(ord, ReleaseOrdering::Natural);
    }

    proptest! {
        #[test]
        fn natural_is_antisymmetric(a in "[0-9A-Z._]{0,10}", b in "[0-9A-Z._]{0,10}") {
            let ord = ReleaseOrdering::Natural;
            prop_assert_eq!(ord.compare(&a, &b), ord.compare(&b, &a).reverse());
            if ord.compare(&a, &b) == Ordering::Equal {
                prop_assert_eq!(&a, &b);
            }
        }
    }
}
