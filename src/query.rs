//! Queries as seen by the highlighter.
//!
//! - [`clause`] - the query tree
//! - [`extractor`] - flattening into weighted terms and positional constraints

pub mod clause;
pub mod extractor;

pub use clause::{BooleanClause, Occur, PhraseQuery, PhraseTerm, Query, TermQuery};
pub use extractor::{PositionalConstraint, WeightedQuery, WeightedTerm};
