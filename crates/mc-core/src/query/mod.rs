//! # Directory Query Language
//!
//! A query is one path segment. Terms are split on `|`; a term containing
//! `=` is scoped to a field, any other term is matched against every field.
//! See [`parser`] for the grammar, [`matcher`] for per-term evaluation and
//! [`engine`] for the filter/projection pass.

pub mod engine;
pub mod matcher;
pub mod parser;

use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Fields a lone bare term may project onto.
pub const DEFAULT_PROJECTABLE_KEYS: [&str; 9] = [
    "_id",
    "first_name",
    "last_name",
    "affiliation",
    "role",
    "video_link",
    "video",
    "email",
    "website_link",
];

/// One atomic filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    /// `key=value`: substring match on a single field.
    Keyed { key: String, value: String },
    /// Substring match on any field.
    Bare { text: String },
}

impl Term {
    pub fn keyed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Term::Keyed {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn bare(text: impl Into<String>) -> Self {
        Term::Bare { text: text.into() }
    }

    /// The text compared against field values.
    pub fn needle(&self) -> &str {
        match self {
            Term::Keyed { value, .. } => value,
            Term::Bare { text } => text,
        }
    }
}

/// How per-term results combine into a record decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Keep a record when any term hits.
    #[default]
    Any,
    /// Keep a record only when every term hits.
    All,
}

impl Combinator {
    pub fn accepts(self, hits: usize, terms: usize) -> bool {
        match self {
            Combinator::Any => hits > 0,
            Combinator::All => hits == terms,
        }
    }
}

/// A keyed term whose field was missing from at least one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{key} is not a valid key value.")]
pub struct InvalidKey {
    pub key: String,
    /// Position of the offending term in the segment.
    pub term: usize,
    /// Number of records that lacked the field.
    pub records: usize,
}

/// The records a query selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Selection<'a> {
    /// Input records that matched, in input order.
    Matched(Vec<&'a Record>),
    /// One single-field object per input record.
    Projected(Vec<Record>),
}

impl Selection<'_> {
    pub fn len(&self) -> usize {
        match self {
            Selection::Matched(r) => r.len(),
            Selection::Projected(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_projection(&self) -> bool {
        matches!(self, Selection::Projected(_))
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Selection::Matched(r) => r.into_iter().cloned().collect(),
            Selection::Projected(r) => r,
        }
    }
}

/// Result of one engine pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<'a> {
    pub selection: Selection<'a>,
    pub invalid_keys: Vec<InvalidKey>,
}

impl Outcome<'_> {
    pub fn has_invalid_keys(&self) -> bool {
        !self.invalid_keys.is_empty()
    }

    pub fn into_response(self) -> Response {
        Response {
            records: self.selection.into_records(),
            invalid_keys: self.invalid_keys,
        }
    }
}

/// Owned form of [`Outcome`], detached from the source snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub records: Vec<Record>,
    pub invalid_keys: Vec<InvalidKey>,
}
