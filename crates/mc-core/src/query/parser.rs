//! # Query Segment Parser
//!
//! ```text
//! segment := term ( "|" term )*
//! term    := key "=" value      (split on the first "=")
//!          | text
//! ```
//!
//! Nothing is rejected. Keys are not checked here; an unknown key surfaces
//! later as an [`InvalidKey`](super::InvalidKey).

use super::Term;

/// Split a raw segment into ordered terms. An empty segment has no terms.
pub fn parse(segment: &str) -> Vec<Term> {
    if segment.is_empty() {
        return Vec::new();
    }
    segment.split('|').map(parse_term).collect()
}

fn parse_term(raw: &str) -> Term {
    match raw.split_once('=') {
        Some((key, value)) => Term::keyed(key, value),
        None => Term::bare(raw),
    }
}
