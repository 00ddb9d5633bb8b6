//! Splitting a field into scored fragments and picking the best ones.
//!
//! Fragments are cut at token boundaries. A boundary that falls inside a
//! matched span is avoided so that a phrase match is never split across two
//! fragments, unless no other boundary is available.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::highlight::scorer::{ScoredField, WeightedSpan};

/// Order in which selected fragments are returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentOrder {
    /// Best score first.
    #[default]
    Score,
    /// Position in the document.
    Document,
}

/// A contiguous excerpt of the text with the spans overlapping it.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
    pub score: f32,
    /// Spans overlapping the fragment, unclipped, ordered by start offset.
    pub spans: Vec<WeightedSpan>,
}

impl Fragment {
    /// A fragment without any matches.
    pub fn plain(start: usize, end: usize) -> Self {
        Fragment {
            start,
            end,
            score: 0.0,
            spans: Vec::new(),
        }
    }
}

/// Cuts text into fragments of roughly `fragment_size` characters.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    fragment_size: usize,
}

impl Fragmenter {
    pub fn new(fragment_size: usize) -> Self {
        Fragmenter { fragment_size }
    }

    /// Cut `text` into consecutive fragments covering all of it and score each.
    pub fn fragment(&self, text: &str, field: &ScoredField) -> Vec<Fragment> {
        let text_len = text.len();

        let mut spans = field.spans.clone();
        spans.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
        let straddle = StraddleIndex::new(&spans);

        let mut bounds = Vec::new();
        let mut fragment_start = 0;
        let mut last_safe: Option<usize> = None;

        for token in &field.tokens {
            let boundary = token.start.min(text_len);
            if boundary <= fragment_start {
                continue;
            }
            let length = char_len(text, fragment_start, token.end.min(text_len));
            if length > self.fragment_size {
                let cut = if !straddle.is_straddled(boundary) {
                    boundary
                } else {
                    last_safe.unwrap_or(boundary)
                };
                bounds.push((fragment_start, cut));
                fragment_start = cut;
                last_safe = None;
            } else if !straddle.is_straddled(boundary) {
                last_safe = Some(boundary);
            }
        }
        if fragment_start < text_len || bounds.is_empty() {
            bounds.push((fragment_start, text_len));
        }

        bounds
            .into_iter()
            .map(|(start, end)| {
                let limit = spans.partition_point(|span| span.start < end);
                let overlapping: Vec<WeightedSpan> = spans[..limit]
                    .iter()
                    .filter(|span| span.end > start)
                    .copied()
                    .collect();
                Fragment {
                    start,
                    end,
                    score: overlapping.iter().map(|span| span.weight).sum(),
                    spans: overlapping,
                }
            })
            .collect()
    }
}

/// Answers "does any span cross this offset" with a binary search.
struct StraddleIndex {
    starts: Vec<usize>,
    /// Running maximum of span ends, in start order.
    max_ends: Vec<usize>,
}

impl StraddleIndex {
    fn new(sorted_spans: &[WeightedSpan]) -> Self {
        let mut max_end = 0;
        let max_ends = sorted_spans
            .iter()
            .map(|span| {
                max_end = max_end.max(span.end);
                max_end
            })
            .collect();
        StraddleIndex {
            starts: sorted_spans.iter().map(|span| span.start).collect(),
            max_ends,
        }
    }

    fn is_straddled(&self, offset: usize) -> bool {
        let count = self.starts.partition_point(|&start| start < offset);
        count > 0 && self.max_ends[count - 1] > offset
    }
}

fn char_len(text: &str, start: usize, end: usize) -> usize {
    if end <= start {
        return 0;
    }
    text.get(start..end)
        .map(|slice| slice.chars().count())
        .unwrap_or(end - start)
}

/// Keep the `max_fragments` best scoring fragments.
///
/// Fragments without matches are dropped. Ties are broken by position.
pub fn select_fragments(
    mut fragments: Vec<Fragment>,
    max_fragments: usize,
    order: FragmentOrder,
) -> Vec<Fragment> {
    fragments.retain(|fragment| fragment.score > 0.0);
    fragments.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.start.cmp(&b.start),
        other => other,
    });
    fragments.truncate(max_fragments);
    if order == FragmentOrder::Document {
        fragments.sort_by_key(|fragment| fragment.start);
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::scorer::TokenOffsets;

    fn field_for(text: &str, spans: Vec<WeightedSpan>) -> ScoredField {
        let mut tokens = Vec::new();
        let mut offset = 0;
        for word in text.split(' ') {
            tokens.push(TokenOffsets {
                start: offset,
                end: offset + word.len(),
            });
            offset += word.len() + 1;
        }
        ScoredField { spans, tokens }
    }

    #[test]
    fn test_single_fragment_when_text_fits() {
        let text = "the fox did not jump";
        let field = field_for(text, vec![WeightedSpan::new(4, 7, 1.0)]);
        let fragments = Fragmenter::new(150).fragment(text, &field);
        assert_eq!(fragments.len(), 1);
        assert_eq!((fragments[0].start, fragments[0].end), (0, 20));
        assert_eq!(fragments[0].score, 1.0);
    }

    #[test]
    fn test_fragments_cover_text() {
        let text = "aaa bbb ccc ddd eee fff ggg";
        let field = field_for(text, Vec::new());
        let fragments = Fragmenter::new(8).fragment(text, &field);
        let bounds: Vec<(usize, usize)> = fragments.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(bounds, vec![(0, 8), (8, 16), (16, 24), (24, 27)]);
    }

    #[test]
    fn test_cut_avoids_matched_span() {
        let text = "aaa bbb ccc ddd eee";
        // "bbb ccc" is a phrase match; cutting at "ccc" would split it.
        let field = field_for(text, vec![WeightedSpan::new(4, 11, 1.0)]);
        let fragments = Fragmenter::new(9).fragment(text, &field);
        assert_eq!((fragments[0].start, fragments[0].end), (0, 4));
        assert_eq!(fragments[1].start, 4);
        assert!(fragments[1].end >= 11);
        assert_eq!(fragments[1].score, 1.0);
    }

    #[test]
    fn test_cut_inside_span_when_no_boundary_is_free() {
        let text = "aaa bbb ccc ddd eee";
        let field = field_for(text, vec![WeightedSpan::new(0, text.len(), 1.0)]);
        let fragments = Fragmenter::new(9).fragment(text, &field);

        let bounds: Vec<(usize, usize)> = fragments.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(bounds, vec![(0, 8), (8, 16), (16, 19)]);
        for fragment in &fragments {
            assert_eq!(fragment.score, 1.0);
            assert_eq!(fragment.spans, vec![WeightedSpan::new(0, 19, 1.0)]);
        }
    }

    #[test]
    fn test_overlapping_spans_both_count() {
        let text = "the fox";
        let field = field_for(
            text,
            vec![WeightedSpan::new(4, 7, 2.0), WeightedSpan::new(4, 7, 3.0)],
        );
        let fragments = Fragmenter::new(150).fragment(text, &field);
        assert_eq!(fragments[0].score, 5.0);
        assert_eq!(fragments[0].spans.len(), 2);
    }

    #[test]
    fn test_empty_text() {
        let fragments = Fragmenter::new(10).fragment("", &ScoredField::default());
        assert_eq!(fragments, vec![Fragment::plain(0, 0)]);
    }

    #[test]
    fn test_select_by_score_then_position() {
        let fragment = |start: usize, score: f32| Fragment {
            start,
            end: start + 5,
            score,
            spans: Vec::new(),
        };
        let fragments = vec![
            fragment(0, 1.0),
            fragment(5, 0.0),
            fragment(10, 3.0),
            fragment(15, 1.0),
            fragment(20, 2.0),
        ];

        let selected = select_fragments(fragments.clone(), 3, FragmentOrder::Score);
        let starts: Vec<usize> = selected.iter().map(|f| f.start).collect();
        assert_eq!(starts, vec![10, 20, 0]);

        let selected = select_fragments(fragments.clone(), 3, FragmentOrder::Document);
        let starts: Vec<usize> = selected.iter().map(|f| f.start).collect();
        assert_eq!(starts, vec![0, 10, 20]);

        let selected = select_fragments(fragments, 10, FragmentOrder::Score);
        assert_eq!(selected.len(), 4);
    }
}
