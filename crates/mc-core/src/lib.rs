//! # mc-core: records and the directory query engine
//!
//! Defines the loosely-typed [`Record`] that every directory entry (a person,
//! an achievement) is stored as, and the small query language that the
//! `/data` endpoint exposes over a snapshot of those records.
//!
//! A query is a single path segment such as `role=admin|smith`:
//!
//! - terms are separated by `|`
//! - `key=value` scopes a term to one field
//! - anything else is matched against every field
//!
//! Matching is case-insensitive substring containment. A lone bare term that
//! names a projectable field (`email`) reshapes the output to that field only.
//!
//! The engine is a pure function of `(records, segment)`; it never touches
//! storage and holds no state between calls.

pub mod query;
pub mod record;

pub use query::engine::FilterEngine;
pub use query::matcher::{matches, Match, TermMatcher};
pub use query::parser::parse;
pub use query::{
    Combinator, InvalidKey, Outcome, Response, Selection, Term, DEFAULT_PROJECTABLE_KEYS,
};
pub use record::{JsonExport, Record, RecordError, RecordSource, Value};
