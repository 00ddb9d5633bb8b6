//! # termlight
//!
//! Token stream reconstruction from stored term vectors, and query-driven
//! highlighting on top of it.
//!
//! ## Features
//!
//! - Rebuilds a field's token stream (terms, offsets, position increments,
//!   payloads) from per-term occurrence records, without re-analyzing text
//! - Preserves overlapping tokens such as synonyms and multi-word tokens
//! - Flattens a query into term weights and positional constraints once, and
//!   shares the result across documents and threads
//! - Scores, selects and marks up the best fragments of a field
//! - A small CLI over JSON term vectors and queries

pub mod analysis;
pub mod cli;
pub mod error;
pub mod highlight;
pub mod query;
pub mod term_vector;

pub mod prelude {
    pub use crate::analysis::{Token, TokenStream};
    pub use crate::error::{Result, TermlightError};
    pub use crate::highlight::{FieldHighlight, HighlightConfig, Highlighter};
    pub use crate::query::{Query, WeightedQuery};
    pub use crate::term_vector::{FieldTermVector, TermVectorFlags, TermVectors};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
