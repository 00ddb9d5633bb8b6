//! Term vectors and token stream reconstruction.
//!
//! - [`terms`] - stored per-term occurrence records and term vector sources
//! - [`merger`] - k-way merge of occurrence lists into document order
//! - [`stream`] - the [`TokenStream`](crate::analysis::TokenStream) adapter and helpers
//!
//! # Examples
//!
//! ```
//! use termlight::analysis::Token;
//! use termlight::term_vector::{FieldTermVector, TermVectorFlags, token_stream};
//!
//! let vector = FieldTermVector::from_tokens(
//!     "body",
//!     vec![Token::new("hello", 0, 5), Token::new("world", 6, 11)],
//!     TermVectorFlags::offsets(),
//! ).unwrap();
//! let texts: Vec<String> = token_stream(&vector).unwrap().map(|t| t.text).collect();
//! assert_eq!(texts, vec!["hello", "world"]);
//! ```

pub mod merger;
pub mod stream;
pub mod terms;

pub use merger::OccurrenceMerger;
pub use stream::{
    TermVectorTokenStream, token_stream, token_stream_for_field, token_stream_with_offsets,
};
pub use terms::{
    FieldTermVector, Occurrence, TermVectorEntry, TermVectorFlags, TermVectorSource, TermVectors,
};
