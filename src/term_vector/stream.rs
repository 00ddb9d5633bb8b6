//! Token streams rebuilt from stored term vectors.

use crate::analysis::token::{Token, TokenAttributes, TokenStream};
use crate::error::{Result, TermlightError};
use crate::term_vector::merger::OccurrenceMerger;
use crate::term_vector::terms::{FieldTermVector, TermVectorSource};

/// A [`TokenStream`] over a field's term vector.
///
/// Construction validates the term vector; afterwards iteration and
/// [`TokenStream::reset`] cannot fail.
#[derive(Debug)]
pub struct TermVectorTokenStream<'a> {
    merger: OccurrenceMerger<'a>,
}

impl<'a> TermVectorTokenStream<'a> {
    /// Create a stream over every occurrence of the field.
    pub fn new(vector: &'a FieldTermVector) -> Result<Self> {
        Ok(TermVectorTokenStream {
            merger: OccurrenceMerger::new(vector)?,
        })
    }

    /// Create a stream that stops at tokens starting after `max_start_offset`.
    pub fn with_max_start_offset(
        vector: &'a FieldTermVector,
        max_start_offset: usize,
    ) -> Result<Self> {
        let limit = u32::try_from(max_start_offset).unwrap_or(u32::MAX);
        Ok(TermVectorTokenStream {
            merger: OccurrenceMerger::with_max_start_offset(vector, Some(limit))?,
        })
    }

    /// The field the stream was built from.
    pub fn field(&self) -> &str {
        self.merger.field()
    }

    /// Number of tokens in one full pass.
    pub fn token_count(&self) -> usize {
        self.merger.token_count()
    }
}

impl Iterator for TermVectorTokenStream<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.merger.next()
    }
}

impl TokenStream for TermVectorTokenStream<'_> {
    fn reset(&mut self) {
        self.merger.reset();
    }

    fn attributes(&self) -> TokenAttributes {
        self.merger.attributes()
    }
}

/// Rebuild the token stream of a field.
///
/// Fails with [`TermlightError::MissingOffsets`] when offsets were not stored.
pub fn token_stream(vector: &FieldTermVector) -> Result<TermVectorTokenStream<'_>> {
    TermVectorTokenStream::new(vector)
}

/// Rebuild the token stream of a field if it stored offsets.
///
/// Returns `Ok(None)` when the field was stored without offsets at all, so
/// callers can fall back to another token source. Individual occurrences
/// lacking offsets in a field that claims them are still an error.
pub fn token_stream_with_offsets(
    vector: &FieldTermVector,
) -> Result<Option<TermVectorTokenStream<'_>>> {
    if !vector.flags().offsets {
        return Ok(None);
    }
    TermVectorTokenStream::new(vector).map(Some)
}

/// Rebuild the token stream of a named field from a term vector source.
pub fn token_stream_for_field<'a, S>(source: &'a S, field: &str) -> Result<TermVectorTokenStream<'a>>
where
    S: TermVectorSource + ?Sized,
{
    let vector = source
        .field(field)
        .ok_or_else(|| TermlightError::field_not_found(field))?;
    TermVectorTokenStream::new(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_vector::terms::{TermVectorFlags, TermVectors};

    fn tokens() -> Vec<Token> {
        vec![
            Token::new("hello", 0, 5),
            Token::new("big", 6, 9),
            Token::new("world", 10, 15),
        ]
    }

    #[test]
    fn test_attributes_follow_flags() {
        let vector = FieldTermVector::from_tokens("body", tokens(), TermVectorFlags::offsets()).unwrap();
        let stream = token_stream(&vector).unwrap();
        let attributes = stream.attributes();
        assert!(attributes.offsets);
        assert!(!attributes.positions);
        assert!(!attributes.payloads);

        let vector = FieldTermVector::from_tokens("body", tokens(), TermVectorFlags::all()).unwrap();
        assert_eq!(token_stream(&vector).unwrap().attributes(), TokenAttributes::all());
    }

    #[test]
    fn test_reset_restarts_stream() {
        let vector = FieldTermVector::from_tokens("body", tokens(), TermVectorFlags::offsets()).unwrap();
        let mut stream = token_stream(&vector).unwrap();
        assert_eq!(stream.token_count(), 3);

        assert_eq!(stream.next().unwrap().text, "hello");
        assert_eq!(stream.next().unwrap().text, "big");
        stream.reset();
        let all: Vec<Token> = stream.collect();
        assert_eq!(all, tokens());
    }

    #[test]
    fn test_with_offsets_returns_none_without_offsets() {
        let vector = FieldTermVector::from_tokens("body", tokens(), TermVectorFlags::positions()).unwrap();
        assert!(token_stream_with_offsets(&vector).unwrap().is_none());
        assert!(token_stream(&vector).is_err());
    }

    #[test]
    fn test_max_start_offset() {
        let vector = FieldTermVector::from_tokens("body", tokens(), TermVectorFlags::offsets()).unwrap();
        let stream = TermVectorTokenStream::with_max_start_offset(&vector, 6).unwrap();
        let texts: Vec<String> = stream.map(|t| t.text).collect();
        assert_eq!(texts, vec!["hello", "big"]);
    }

    #[test]
    fn test_stream_for_field() {
        let mut vectors = TermVectors::new();
        vectors.add_field(FieldTermVector::from_tokens(
            "body",
            tokens(),
            TermVectorFlags::offsets(),
        ).unwrap());

        let stream = token_stream_for_field(&vectors, "body").unwrap();
        assert_eq!(stream.field(), "body");

        let err = token_stream_for_field(&vectors, "title").unwrap_err();
        assert!(matches!(err, TermlightError::FieldNotFound(_)));
    }
}
