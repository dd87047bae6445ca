//! # Filter/Project Engine
//!
//! Runs a parsed segment over a record snapshot:
//!
//! 1. no terms: every record, in order
//! 2. a single bare term naming a projectable key: one single-field object
//!    per record
//! 3. otherwise: records accepted by the [`Combinator`], in order, plus one
//!    [`InvalidKey`] per keyed term whose field some record lacked

use super::matcher::{Match, TermMatcher};
use super::parser::parse;
use super::{Combinator, InvalidKey, Outcome, Response, Selection, Term, DEFAULT_PROJECTABLE_KEYS};
use crate::record::{Record, RecordSource};

/// Stateless query runner. Cheap to share between requests.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    projectable: Vec<String>,
    combinator: Combinator,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECTABLE_KEYS)
    }
}

impl FilterEngine {
    pub fn new<I, S>(projectable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projectable: projectable.into_iter().map(Into::into).collect(),
            combinator: Combinator::default(),
        }
    }

    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub fn projectable_keys(&self) -> &[String] {
        &self.projectable
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Evaluate `segment` against `records`.
    pub fn run<'a>(&self, records: &'a [Record], segment: &str) -> Outcome<'a> {
        let terms = parse(segment);
        self.run_terms(records, &terms)
    }

    pub fn run_terms<'a>(&self, records: &'a [Record], terms: &[Term]) -> Outcome<'a> {
        if terms.is_empty() {
            return Outcome {
                selection: Selection::Matched(records.iter().collect()),
                invalid_keys: Vec::new(),
            };
        }

        if let Some(field) = self.projection_field(terms) {
            return Outcome {
                selection: Selection::Projected(records.iter().map(|r| r.project(field)).collect()),
                invalid_keys: Vec::new(),
            };
        }

        let matchers: Vec<TermMatcher<'_>> = terms.iter().map(TermMatcher::new).collect();
        let mut missing = vec![0usize; matchers.len()];

        let matched = records
            .iter()
            .filter(|record| {
                // every term runs so missing keys are counted on every record
                let mut hits = 0;
                for (slot, matcher) in missing.iter_mut().zip(&matchers) {
                    match matcher.check(record) {
                        Match::Hit => hits += 1,
                        Match::Miss => {}
                        Match::MissingKey => *slot += 1,
                    }
                }
                self.combinator.accepts(hits, matchers.len())
            })
            .collect();

        let invalid_keys = terms
            .iter()
            .zip(missing)
            .enumerate()
            .filter_map(|(index, (term, count))| match term {
                Term::Keyed { key, .. } if count > 0 => Some(InvalidKey {
                    key: key.clone(),
                    term: index,
                    records: count,
                }),
                _ => None,
            })
            .collect();

        Outcome {
            selection: Selection::Matched(matched),
            invalid_keys,
        }
    }

    /// Fetch a snapshot from `source` and run `segment` over it.
    pub fn query<S>(&self, source: &S, segment: &str) -> Result<Response, S::Error>
    where
        S: RecordSource + ?Sized,
    {
        let records = source.fetch_all()?;
        Ok(self.run(&records, segment).into_response())
    }

    fn projection_field<'t>(&self, terms: &'t [Term]) -> Option<&'t str> {
        match terms {
            [Term::Bare { text }] if self.projectable.iter().any(|k| k == text) => {
                Some(text.as_str())
            }
            _ => None,
        }
    }
}
