//! Token model shared by every text-processing component.
//!
//! Tokenization itself happens upstream; this module only defines what a
//! token looks like and how streams of them are consumed.

pub mod token;

pub use token::{CannedTokenStream, IntoTokenStream, Token, TokenAttributes, TokenStream};
