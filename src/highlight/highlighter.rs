//! The highlighting entry point.

use std::fmt;
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenStream;
use crate::error::{Result, TermlightError};
use crate::highlight::config::HighlightConfig;
use crate::highlight::fragmenter::{Fragment, Fragmenter, select_fragments};
use crate::highlight::markup::{Encoder, Formatter, default_encode, html_encode, tag_formatter};
use crate::highlight::renderer::Renderer;
use crate::highlight::scorer::{ScoredField, SpanScorer};
use crate::query::clause::Query;
use crate::query::extractor::WeightedQuery;
use crate::term_vector::stream::TermVectorTokenStream;
use crate::term_vector::terms::{FieldTermVector, TermVectorSource};

/// Represents a highlighted fragment of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightFragment {
    /// The marked-up fragment text.
    pub text: String,
    /// Starting offset in the original text.
    pub start_offset: usize,
    /// Ending offset in the original text.
    pub end_offset: usize,
    /// Sum of the weights of the spans overlapping the fragment.
    pub score: f32,
}

impl HighlightFragment {
    /// Create a new highlight fragment.
    pub fn new(text: String, start_offset: usize, end_offset: usize, score: f32) -> Self {
        HighlightFragment {
            text,
            start_offset,
            end_offset,
            score,
        }
    }
}

/// Represents highlight information for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHighlight {
    /// Field name.
    pub field_name: String,
    /// Highlighted fragments.
    pub fragments: Vec<HighlightFragment>,
    /// Whether the unhighlighted leading fragment was returned for lack of matches.
    pub is_entire_field: bool,
}

impl FieldHighlight {
    /// Create a new field highlight.
    pub fn new<S: Into<String>>(field_name: S) -> Self {
        FieldHighlight {
            field_name: field_name.into(),
            fragments: Vec::new(),
            is_entire_field: false,
        }
    }

    /// Add a fragment to this field highlight.
    pub fn add_fragment(&mut self, fragment: HighlightFragment) {
        self.fragments.push(fragment);
    }

    /// Get the best fragment (highest score, earliest on ties).
    pub fn best_fragment(&self) -> Option<&HighlightFragment> {
        self.fragments.iter().reduce(|best, fragment| {
            if fragment.score > best.score
                || (fragment.score == best.score && fragment.start_offset < best.start_offset)
            {
                fragment
            } else {
                best
            }
        })
    }

    /// Combine all fragments into a single string.
    pub fn combined_text(&self, separator: &str) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Whether any fragment was produced.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Highlights documents against one query.
///
/// The query is extracted once; the highlighter can then be used for any
/// number of documents, from any number of threads.
#[derive(Clone)]
pub struct Highlighter {
    config: HighlightConfig,
    query: Arc<WeightedQuery>,
    renderer: Renderer,
}

impl fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Highlighter")
            .field("config", &self.config)
            .field("terms", &self.query.len())
            .field("constraints", &self.query.constraints().len())
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl Highlighter {
    /// Create a highlighter for a query, using terms of every field.
    pub fn new(query: &Query, config: HighlightConfig) -> Result<Self> {
        let weighted = WeightedQuery::extract(query)?;
        Ok(Self::with_weighted_query(Arc::new(weighted), config))
    }

    /// Create a highlighter for the clauses of a query that apply to `field`.
    pub fn for_field(query: &Query, field: &str, config: HighlightConfig) -> Result<Self> {
        let weighted = WeightedQuery::extract_for_field(query, Some(field))?;
        Ok(Self::with_weighted_query(Arc::new(weighted), config))
    }

    /// Create a highlighter sharing an already extracted query.
    pub fn with_weighted_query(query: Arc<WeightedQuery>, config: HighlightConfig) -> Self {
        let encoder: Arc<Encoder> = if config.html_escape {
            Arc::new(html_encode)
        } else {
            Arc::new(default_encode)
        };
        let formatter = tag_formatter(config.opening_tag(), config.closing_tag());
        Highlighter {
            config,
            query,
            renderer: Renderer::new(encoder, formatter),
        }
    }

    /// Replace the encoder applied to all output text.
    pub fn with_encoder<E>(mut self, encoder: E) -> Self
    where
        E: Fn(&str) -> String + Send + Sync + 'static,
    {
        let formatter = self.renderer.formatter();
        self.renderer = Renderer::new(Arc::new(encoder), formatter);
        self
    }

    /// Replace the formatter applied to highlighted regions.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, f32) -> String + Send + Sync + 'static,
    {
        let encoder = self.renderer.encoder();
        self.renderer = Renderer::new(encoder, Arc::new(formatter) as Arc<Formatter>);
        self
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    pub fn weighted_query(&self) -> &Arc<WeightedQuery> {
        &self.query
    }

    /// The best scoring fragments of `text`, marked up.
    ///
    /// `stream` must describe `text`: every token offset has to lie on a
    /// character boundary of it.
    pub fn best_text_fragments<S>(&self, stream: &mut S, text: &str) -> Result<Vec<HighlightFragment>>
    where
        S: TokenStream + ?Sized,
    {
        Ok(self.highlight_fragments(stream, text)?.0)
    }

    /// The best scoring fragments of `text` as strings.
    pub fn best_fragments<S>(&self, stream: &mut S, text: &str) -> Result<Vec<String>>
    where
        S: TokenStream + ?Sized,
    {
        Ok(self
            .best_text_fragments(stream, text)?
            .into_iter()
            .map(|fragment| fragment.text)
            .collect())
    }

    /// The single best fragment, if any.
    pub fn best_fragment<S>(&self, stream: &mut S, text: &str) -> Result<Option<String>>
    where
        S: TokenStream + ?Sized,
    {
        Ok(self.best_fragments(stream, text)?.into_iter().next())
    }

    /// All selected fragments joined with the configured separator.
    pub fn highlight<S>(&self, stream: &mut S, text: &str) -> Result<String>
    where
        S: TokenStream + ?Sized,
    {
        Ok(self
            .best_fragments(stream, text)?
            .join(&self.config.fragment_separator))
    }

    /// Highlight `text` using the tokens rebuilt from its term vector.
    pub fn highlight_term_vector(
        &self,
        vector: &FieldTermVector,
        text: &str,
    ) -> Result<FieldHighlight> {
        self.config.validate()?;
        let analyzed = analyzed_prefix(text, self.config.max_analyzed_chars);
        let mut stream = TermVectorTokenStream::with_max_start_offset(vector, analyzed.len())?;
        let (fragments, is_entire_field) = self.highlight_fragments(&mut stream, text)?;

        Ok(FieldHighlight {
            field_name: vector.field().to_string(),
            fragments,
            is_entire_field,
        })
    }

    /// Highlight a named field of a document's term vectors.
    pub fn highlight_field<V>(&self, vectors: &V, field: &str, text: &str) -> Result<FieldHighlight>
    where
        V: TermVectorSource + ?Sized,
    {
        let vector = vectors
            .field(field)
            .ok_or_else(|| TermlightError::field_not_found(field))?;
        self.highlight_term_vector(vector, text)
    }

    /// Highlight many `(term vector, text)` pairs in parallel.
    ///
    /// Results are returned in input order; one failing document does not
    /// affect the others.
    pub fn highlight_batch(
        &self,
        documents: &[(&FieldTermVector, &str)],
    ) -> Vec<Result<FieldHighlight>> {
        documents
            .par_iter()
            .map(|(vector, text)| self.highlight_term_vector(vector, text))
            .collect()
    }

    fn highlight_fragments<S>(&self, stream: &mut S, text: &str) -> Result<(Vec<HighlightFragment>, bool)>
    where
        S: TokenStream + ?Sized,
    {
        self.config.validate()?;

        let analyzed = analyzed_prefix(text, self.config.max_analyzed_chars);
        let mut scorer = SpanScorer::new(&self.query);
        if analyzed.len() < text.len() {
            scorer = scorer.with_max_end_offset(analyzed.len());
        }
        let scored = scorer.score(stream);
        check_offsets(&scored, analyzed)?;

        let fragments = Fragmenter::new(self.config.fragment_size).fragment(analyzed, &scored);
        let total = fragments.len();
        let leading = fragments.first().map(|f| Fragment::plain(f.start, f.end));
        let mut selected =
            select_fragments(fragments, self.config.max_fragments, self.config.fragment_order);

        let mut is_entire_field = false;
        if selected.is_empty() && self.config.return_entire_field_if_no_highlight {
            selected.extend(leading);
            is_entire_field = true;
        }

        debug!(
            "selected {} of {} fragments from {} spans",
            selected.len(),
            total,
            scored.spans.len()
        );

        let rendered = selected
            .iter()
            .map(|fragment| {
                HighlightFragment::new(
                    self.renderer.render(analyzed, fragment),
                    fragment.start,
                    fragment.end,
                    fragment.score,
                )
            })
            .collect();
        Ok((rendered, is_entire_field))
    }
}

/// The first `max_chars` characters of `text`.
fn analyzed_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn check_offsets(scored: &ScoredField, text: &str) -> Result<()> {
    for token in &scored.tokens {
        if token.start > token.end
            || !text.is_char_boundary(token.start)
            || !text.is_char_boundary(token.end)
        {
            return Err(TermlightError::invalid_token_offsets(
                token.start,
                token.end,
                text.len(),
            ));
        }
    }
    Ok(())
}
