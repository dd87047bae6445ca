//! # Term Matcher
//!
//! Evaluates one [`Term`] against one [`Record`]. Comparison is
//! case-insensitive substring containment over [`Value::to_text`].
//!
//! [`Value::to_text`]: crate::record::Value::to_text

use super::Term;
use crate::record::Record;

/// Per-record result of a single term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Hit,
    Miss,
    /// Keyed term naming a field the record does not have.
    MissingKey,
}

impl Match {
    pub fn is_hit(self) -> bool {
        self == Match::Hit
    }
}

/// A term with its needle lower-cased once, reusable across records.
#[derive(Debug, Clone)]
pub struct TermMatcher<'t> {
    term: &'t Term,
    needle: String,
}

impl<'t> TermMatcher<'t> {
    pub fn new(term: &'t Term) -> Self {
        Self {
            term,
            needle: term.needle().to_lowercase(),
        }
    }

    pub fn term(&self) -> &'t Term {
        self.term
    }

    pub fn check(&self, record: &Record) -> Match {
        match self.term {
            Term::Bare { .. } => {
                let hit = record
                    .iter()
                    .filter_map(|(_, value)| value.to_text())
                    .any(|text| contains_ci(&text, &self.needle));
                if hit {
                    Match::Hit
                } else {
                    Match::Miss
                }
            }
            Term::Keyed { key, .. } => match record.get(key) {
                None => Match::MissingKey,
                Some(value) => match value.to_text() {
                    Some(text) if contains_ci(&text, &self.needle) => Match::Hit,
                    _ => Match::Miss,
                },
            },
        }
    }
}

/// Evaluate `term` against `record`.
pub fn matches(record: &Record, term: &Term) -> Match {
    TermMatcher::new(term).check(record)
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
