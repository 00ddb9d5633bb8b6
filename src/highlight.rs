//! Query-driven highlighting.
//!
//! The pipeline for one field of one document:
//!
//! 1. [`scorer`] turns the token stream into weighted offset spans.
//! 2. [`fragmenter`] cuts the text into fragments, scores and selects them.
//! 3. [`renderer`] marks up the selected fragments with [`markup`] functions.
//!
//! [`Highlighter`] ties the steps together.
//!
//! # Examples
//!
//! ```
//! use termlight::analysis::Token;
//! use termlight::highlight::{HighlightConfig, Highlighter};
//! use termlight::query::Query;
//! use termlight::term_vector::{FieldTermVector, TermVectorFlags};
//!
//! let text = "the fox did not jump";
//! let vector = FieldTermVector::from_tokens(
//!     "body",
//!     vec![
//!         Token::new("the", 0, 3),
//!         Token::new("fox", 4, 7),
//!         Token::new("did", 8, 11),
//!         Token::new("not", 12, 15),
//!         Token::new("jump", 16, 20),
//!     ],
//!     TermVectorFlags::offsets(),
//! ).unwrap();
//!
//! let highlighter = Highlighter::new(&Query::term("fox"), HighlightConfig::default()).unwrap();
//! let highlight = highlighter.highlight_term_vector(&vector, text).unwrap();
//! assert_eq!(highlight.combined_text("..."), "the <B>fox</B> did not jump");
//! ```

pub mod config;
pub mod fragmenter;
pub mod highlighter;
pub mod markup;
pub mod renderer;
pub mod scorer;

pub use config::HighlightConfig;
pub use fragmenter::{Fragment, FragmentOrder, Fragmenter, select_fragments};
pub use highlighter::{FieldHighlight, HighlightFragment, Highlighter};
pub use markup::{Encoder, Formatter, default_encode, html_encode, tag_formatter};
pub use renderer::{HighlightRegion, Renderer, merge_spans};
pub use scorer::{ScoredField, SpanScorer, TokenOffsets, WeightedSpan};
