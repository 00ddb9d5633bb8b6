//! Token types and the token stream abstraction.
//!
//! A [`Token`] is one occurrence of a term in a field, in document order. Every
//! consumer of analyzed text (the highlighter included) pulls tokens through
//! the [`TokenStream`] trait, whichever way they were produced: replayed from a
//! fixed list ([`CannedTokenStream`]) or rebuilt from stored term vectors
//! (see [`crate::term_vector::stream`]).
//!
//! # Token Graphs
//!
//! Overlapping tokens, such as synonyms injected at analysis time, are
//! expressed through `position_increment`:
//!
//! ```text
//! Input: "the fox"
//! With synonym: "{fox}"
//!
//!   "the"   [0, 3)  pos_inc=1
//!   "{fox}" [0, 7)  pos_inc=0   <- same position as "the"
//!   "fox"   [4, 7)  pos_inc=1
//! ```
//!
//! # Examples
//!
//! ```
//! use termlight::analysis::token::Token;
//!
//! let token = Token::new("world", 6, 11).with_position_increment(0);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.start_offset, 6);
//! assert_eq!(token.position_increment, 0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single token: term text, character offsets and position information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// Offset where this token starts in the original text
    pub start_offset: usize,

    /// Offset where this token ends in the original text (exclusive)
    pub end_offset: usize,

    /// Position increment from the previous token (default: 1).
    ///
    /// - 1: next position
    /// - 0: same position as the previous token (synonyms, case variants)
    /// - >1: skipped positions (e.g. removed stop words)
    pub position_increment: usize,

    /// Optional payload bytes stored with this occurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl Token {
    /// Create a new token with text and offsets.
    pub fn new<S: Into<String>>(text: S, start_offset: usize, end_offset: usize) -> Self {
        Token {
            text: text.into(),
            start_offset,
            end_offset,
            position_increment: 1,
            payload: None,
        }
    }

    /// Set the position increment.
    pub fn with_position_increment(mut self, increment: usize) -> Self {
        self.position_increment = increment;
        self
    }

    /// Attach payload bytes.
    pub fn with_payload<P: Into<Vec<u8>>>(mut self, payload: P) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Get the length of the token text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Which optional attributes a stream actually carries.
///
/// Offsets are always present on reconstructed streams; positions and
/// payloads depend on what was stored. When positions are missing the
/// increments are synthesized rather than read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAttributes {
    pub offsets: bool,
    pub positions: bool,
    pub payloads: bool,
}

impl TokenAttributes {
    /// All attributes populated.
    pub fn all() -> Self {
        TokenAttributes {
            offsets: true,
            positions: true,
            payloads: true,
        }
    }
}

/// A restartable, single-pass sequence of tokens.
///
/// Callers pull tokens with [`Iterator::next`] until `None`; [`TokenStream::reset`]
/// rewinds to the first token.
pub trait TokenStream: Iterator<Item = Token> {
    /// Rewind the stream to its first token.
    fn reset(&mut self);

    /// Report which optional attributes this stream populates.
    fn attributes(&self) -> TokenAttributes;
}

/// A token stream replaying a fixed list of tokens.
#[derive(Clone, Debug)]
pub struct CannedTokenStream {
    tokens: Vec<Token>,
    next: usize,
    attributes: TokenAttributes,
}

impl CannedTokenStream {
    /// Create a stream over the given tokens, reporting every attribute as present.
    pub fn new(tokens: Vec<Token>) -> Self {
        CannedTokenStream {
            tokens,
            next: 0,
            attributes: TokenAttributes::all(),
        }
    }

    /// Override the reported attributes.
    pub fn with_attributes(mut self, attributes: TokenAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// The full token list, independent of the read cursor.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl Iterator for CannedTokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.next).cloned();
        if token.is_some() {
            self.next += 1;
        }
        token
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tokens.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl TokenStream for CannedTokenStream {
    fn reset(&mut self) {
        self.next = 0;
    }

    fn attributes(&self) -> TokenAttributes {
        self.attributes
    }
}

/// Trait for types that can produce a token stream.
pub trait IntoTokenStream {
    /// The produced stream type.
    type Stream: TokenStream;

    /// Convert this type into a token stream.
    fn into_token_stream(self) -> Self::Stream;
}

impl IntoTokenStream for Vec<Token> {
    type Stream = CannedTokenStream;

    fn into_token_stream(self) -> CannedTokenStream {
        CannedTokenStream::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new("hello", 0, 5);
        assert_eq!(token.text, "hello");
        assert_eq!(token.start_offset, 0);
        assert_eq!(token.end_offset, 5);
        assert_eq!(token.position_increment, 1);
        assert!(token.payload.is_none());
    }

    #[test]
    fn test_token_builders() {
        let token = Token::new("fox", 4, 7)
            .with_position_increment(0)
            .with_payload(vec![1u8, 2, 3]);

        assert_eq!(token.position_increment, 0);
        assert_eq!(token.payload.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(token.len(), 3);
    }

    #[test]
    fn test_token_display() {
        let token = Token::new("hello", 0, 5);
        assert_eq!(format!("{token}"), "hello");
    }

    #[test]
    fn test_canned_stream_reset() {
        let tokens = vec![Token::new("hello", 0, 5), Token::new("world", 6, 11)];

        let mut stream = tokens.into_token_stream();
        let first: Vec<_> = stream.by_ref().collect();
        assert_eq!(first.len(), 2);
        assert!(stream.next().is_none());

        stream.reset();
        let second: Vec<_> = stream.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_canned_stream_attributes() {
        let stream = CannedTokenStream::new(Vec::new()).with_attributes(TokenAttributes {
            offsets: true,
            positions: false,
            payloads: false,
        });
        assert!(stream.attributes().offsets);
        assert!(!stream.attributes().positions);
    }
}
