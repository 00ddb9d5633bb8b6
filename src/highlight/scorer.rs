//! Turning a token stream into weighted offset spans.
//!
//! [`SpanScorer`] makes one pass over a field's tokens. Terms with an
//! unconditional weight produce a span per occurrence. Terms that take part in
//! positional constraints are additionally kept in a sliding window of recent
//! tokens, sized to the widest constraint, and every such token triggers a
//! search for a constraint match ending at it.
//!
//! Matching works on effective positions (the running sum of position
//! increments), so tokens stacked on the same position, such as synonyms,
//! can stand in for each other.

use std::collections::VecDeque;

use ahash::AHashSet;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenStream;
use crate::query::extractor::{PositionalConstraint, WeightedQuery};

/// An offset range matched by the query, with its weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedSpan {
    pub start: usize,
    pub end: usize,
    pub weight: f32,
}

impl WeightedSpan {
    /// Create a new span.
    pub fn new(start: usize, end: usize, weight: f32) -> Self {
        WeightedSpan { start, end, weight }
    }

    /// Whether the span shares at least one offset with `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Length of the span in offsets.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Offsets of one token, kept for fragment boundary decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOffsets {
    pub start: usize,
    pub end: usize,
}

/// Everything the fragmenter needs to know about one field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoredField {
    /// Matched spans, in emission order.
    pub spans: Vec<WeightedSpan>,
    /// Offsets of every scored token, in stream order.
    pub tokens: Vec<TokenOffsets>,
}

impl ScoredField {
    /// Sum of all span weights.
    pub fn total_weight(&self) -> f32 {
        self.spans.iter().map(|span| span.weight).sum()
    }

    /// Whether nothing matched.
    pub fn has_matches(&self) -> bool {
        !self.spans.is_empty()
    }
}

/// A recently seen token relevant to some positional constraint.
#[derive(Debug)]
struct WindowEntry {
    term: String,
    position: i64,
    start: usize,
    end: usize,
}

/// Produces weighted spans for one field of one document.
#[derive(Debug, Clone, Copy)]
pub struct SpanScorer<'q> {
    query: &'q WeightedQuery,
    max_end_offset: Option<usize>,
}

impl<'q> SpanScorer<'q> {
    /// Create a scorer for an extracted query.
    pub fn new(query: &'q WeightedQuery) -> Self {
        SpanScorer {
            query,
            max_end_offset: None,
        }
    }

    /// Ignore tokens ending after `limit`.
    pub fn with_max_end_offset(mut self, limit: usize) -> Self {
        self.max_end_offset = Some(limit);
        self
    }

    /// Score a token stream. The stream is reset before reading.
    pub fn score<S: TokenStream + ?Sized>(&self, stream: &mut S) -> ScoredField {
        stream.reset();

        let mut field = ScoredField::default();
        let mut window: VecDeque<WindowEntry> = VecDeque::new();
        let mut emitted: AHashSet<(usize, usize, usize)> = AHashSet::new();
        let max_window = i64::from(self.query.max_window());
        let mut position: i64 = -1;

        for token in &mut *stream {
            position += token.position_increment as i64;
            if self
                .max_end_offset
                .is_some_and(|limit| token.end_offset > limit)
            {
                continue;
            }

            field.tokens.push(TokenOffsets {
                start: token.start_offset,
                end: token.end_offset,
            });

            let weight = self.query.unconditional_weight(&token.text);
            if weight > 0.0 && token.end_offset > token.start_offset {
                field.spans.push(WeightedSpan::new(
                    token.start_offset,
                    token.end_offset,
                    weight,
                ));
            }

            let constraints = self.query.constraints_for(&token.text);
            if constraints.is_empty() {
                continue;
            }

            while window
                .front()
                .is_some_and(|entry| entry.position < position - max_window)
            {
                window.pop_front();
            }
            window.push_back(WindowEntry {
                term: token.text,
                position,
                start: token.start_offset,
                end: token.end_offset,
            });

            for &index in constraints {
                let constraint = &self.query.constraints()[index];
                if constraint.weight <= 0.0 {
                    continue;
                }
                if let Some((start, end)) = find_match(constraint, &window)
                    && start < end
                    && emitted.insert((index, start, end))
                {
                    field
                        .spans
                        .push(WeightedSpan::new(start, end, constraint.weight));
                }
            }
        }

        debug!(
            "scored {} tokens into {} weighted spans",
            field.tokens.len(),
            field.spans.len()
        );
        field
    }
}

/// Look for a match of `constraint` that includes the newest window entry.
///
/// Returns the union of the matched tokens' offsets.
fn find_match(
    constraint: &PositionalConstraint,
    window: &VecDeque<WindowEntry>,
) -> Option<(usize, usize)> {
    let current_index = window.len().checked_sub(1)?;
    let current = &window[current_index];
    let slots = constraint.slots.len();
    let budget = constraint.window() as i64;

    if constraint.in_order {
        let last = slots - 1;
        if !constraint.accepts(last, &current.term) {
            return None;
        }
        // Taking the latest acceptable entry for each earlier slot keeps the
        // first position as high as possible.
        let mut chosen = vec![current_index];
        let mut bound = current.position;
        for slot in (0..last).rev() {
            let (index, entry) = window
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.position < bound && constraint.accepts(slot, &entry.term))
                .max_by_key(|(index, entry)| (entry.position, *index))?;
            chosen.push(index);
            bound = entry.position;
        }
        if current.position - bound > budget {
            return None;
        }
        return Some(offset_union(window, &chosen));
    }

    find_unordered(constraint, window, current_index, budget)
}

/// Unordered matching as a bipartite matching between the other slots and the
/// distinct positions within `budget` below the newest entry.
///
/// Each slot tries the nearest positions first, so a match keeps close to the
/// newest token. The cost is polynomial in the window size and slot count.
fn find_unordered(
    constraint: &PositionalConstraint,
    window: &VecDeque<WindowEntry>,
    current_index: usize,
    budget: i64,
) -> Option<(usize, usize)> {
    let current = &window[current_index];
    let slots = constraint.slots.len();

    // One row per distinct position, newest first: the latest entry able to
    // fill each slot.
    let mut fillers: Vec<Vec<Option<usize>>> = Vec::new();
    let mut row_position = current.position;
    for (index, entry) in window.iter().enumerate().rev() {
        if entry.position == current.position {
            continue;
        }
        if current.position - entry.position > budget {
            break;
        }
        if entry.position != row_position {
            row_position = entry.position;
            fillers.push(vec![None; slots]);
        }
        if let Some(row) = fillers.last_mut() {
            for (slot, filler) in row.iter_mut().enumerate() {
                if filler.is_none() && constraint.accepts(slot, &entry.term) {
                    *filler = Some(index);
                }
            }
        }
    }
    if fillers.len() + 1 < slots {
        return None;
    }

    for slot in 0..slots {
        if !constraint.accepts(slot, &current.term) {
            continue;
        }
        let mut owners: Vec<Option<usize>> = vec![None; fillers.len()];
        let complete = (0..slots).filter(|&other| other != slot).all(|other| {
            let mut visited = vec![false; fillers.len()];
            augment(other, &fillers, &mut owners, &mut visited)
        });
        if complete {
            let mut chosen = vec![current_index];
            chosen.extend(
                owners
                    .iter()
                    .enumerate()
                    .filter_map(|(row, owner)| owner.and_then(|slot| fillers[row][slot])),
            );
            return Some(offset_union(window, &chosen));
        }
    }
    None
}

/// Find a position for `slot`, moving already placed slots when needed.
fn augment(
    slot: usize,
    fillers: &[Vec<Option<usize>>],
    owners: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for row in 0..fillers.len() {
        if visited[row] || fillers[row][slot].is_none() {
            continue;
        }
        visited[row] = true;
        let placed = owners[row];
        if placed.is_none_or(|other| augment(other, fillers, owners, visited)) {
            owners[row] = Some(slot);
            return true;
        }
    }
    false
}

fn offset_union(window: &VecDeque<WindowEntry>, chosen: &[usize]) -> (usize, usize) {
    let start = chosen
        .iter()
        .map(|&index| window[index].start)
        .min()
        .unwrap_or(0);
    let end = chosen
        .iter()
        .map(|&index| window[index].end)
        .max()
        .unwrap_or(0);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::{IntoTokenStream, Token};
    use crate::query::clause::{PhraseQuery, Query};

    fn fox_tokens() -> Vec<Token> {
        vec![
            Token::new("the", 0, 3),
            Token::new("{fox}", 0, 7).with_position_increment(0),
            Token::new("fox", 4, 7),
            Token::new("did", 8, 11),
            Token::new("not", 12, 15),
            Token::new("jump", 16, 20),
        ]
    }

    fn score(query: &Query, tokens: Vec<Token>) -> ScoredField {
        let weighted = WeightedQuery::extract(query).unwrap();
        let mut stream = tokens.into_token_stream();
        SpanScorer::new(&weighted).score(&mut stream)
    }

    #[test]
    fn test_term_spans() {
        let field = score(
            &Query::disjunction(vec![Query::term("{fox}"), Query::term("fox")]),
            fox_tokens(),
        );
        assert_eq!(
            field.spans,
            vec![WeightedSpan::new(0, 7, 1.0), WeightedSpan::new(4, 7, 1.0)]
        );
        assert_eq!(field.tokens.len(), 6);
        assert_eq!(field.total_weight(), 2.0);
    }

    #[test]
    fn test_absent_terms_contribute_nothing() {
        let field = score(&Query::term("cat"), fox_tokens());
        assert!(!field.has_matches());
        assert_eq!(field.tokens.len(), 6);
    }

    #[test]
    fn test_exact_phrase() {
        let field = score(&Query::phrase(["the", "fox"]), fox_tokens());
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 7, 1.0)]);
    }

    #[test]
    fn test_phrase_requires_adjacency() {
        let field = score(&Query::phrase(["the", "did"]), fox_tokens());
        assert!(field.spans.is_empty());

        let field = score(&Query::near(["the", "did"], 1, true), fox_tokens());
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 11, 1.0)]);
    }

    #[test]
    fn test_phrase_order() {
        let field = score(&Query::phrase(["fox", "the"]), fox_tokens());
        assert!(field.spans.is_empty());

        let field = score(&Query::near(["jump", "did"], 2, false), fox_tokens());
        assert_eq!(field.spans, vec![WeightedSpan::new(8, 20, 1.0)]);
    }

    #[test]
    fn test_synonyms_share_position() {
        // "{fox}" sits on the same position as "the", so it is one position
        // before "did" just like "fox" is.
        let query = Query::Phrase(PhraseQuery::new(["{fox}", "did"]).with_slop(1));
        let field = score(&query, fox_tokens());
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 11, 1.0)]);
    }

    #[test]
    fn test_phrase_alternatives_do_not_duplicate() {
        let tokens = vec![
            Token::new("big", 0, 3),
            Token::new("dog", 4, 7),
            Token::new("hound", 4, 7).with_position_increment(0),
        ];
        let query = Query::Phrase(PhraseQuery::new(["big"]).add_alternatives(["dog", "hound"]));
        let field = score(&query, tokens);
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 7, 1.0)]);
    }

    #[test]
    fn test_repeated_phrase_matches() {
        let tokens = vec![
            Token::new("a", 0, 1),
            Token::new("b", 2, 3),
            Token::new("a", 4, 5),
            Token::new("b", 6, 7),
        ];
        let field = score(&Query::phrase(["a", "b"]).boost(2.0), tokens);
        assert_eq!(
            field.spans,
            vec![WeightedSpan::new(0, 3, 2.0), WeightedSpan::new(4, 7, 2.0)]
        );
    }

    #[test]
    fn test_term_and_phrase_weights_both_apply() {
        let query = Query::disjunction(vec![Query::term("fox"), Query::phrase(["the", "fox"])]);
        let field = score(&query, fox_tokens());
        assert_eq!(
            field.spans,
            vec![WeightedSpan::new(4, 7, 1.0), WeightedSpan::new(0, 7, 1.0)]
        );
    }

    #[test]
    fn test_max_end_offset() {
        let weighted = WeightedQuery::extract(&Query::term("jump")).unwrap();
        let mut stream = fox_tokens().into_token_stream();
        let field = SpanScorer::new(&weighted)
            .with_max_end_offset(15)
            .score(&mut stream);
        assert!(field.spans.is_empty());
        assert_eq!(field.tokens.len(), 5);
    }

    #[test]
    fn test_unordered_needs_distinct_positions() {
        let field = score(&Query::near(["a", "a"], 0, false), vec![Token::new("a", 0, 1)]);
        assert!(field.spans.is_empty());

        let tokens = vec![Token::new("a", 0, 1), Token::new("a", 2, 3)];
        let field = score(&Query::near(["a", "a"], 0, false), tokens);
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 3, 1.0)]);

        // A synonym stacked on the same position cannot fill a second slot.
        let tokens = vec![
            Token::new("a", 0, 1),
            Token::new("b", 0, 1).with_position_increment(0),
        ];
        let field = score(&Query::near(["a", "b"], 3, false), tokens);
        assert!(field.spans.is_empty());
    }

    #[test]
    fn test_unordered_reassigns_slots() {
        // "b" can fill either of the first two slots, "a" only the first, so
        // "b" has to give way once "a" is placed.
        let tokens = vec![
            Token::new("a", 0, 1),
            Token::new("b", 2, 3),
            Token::new("c", 4, 5),
        ];
        let query = Query::Phrase(
            PhraseQuery::new(Vec::<String>::new())
                .add_alternatives(["a", "b"])
                .add_alternatives(["b"])
                .add_alternatives(["c"])
                .in_order(false),
        );
        let field = score(&query, tokens);
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 5, 1.0)]);
    }

    #[test]
    fn test_unsatisfiable_unordered_phrase_stays_fast() {
        let tokens: Vec<Token> = (0..2_000)
            .map(|i| Token::new("a", i * 2, i * 2 + 1))
            .collect();
        let query = Query::near(["a", "a", "a", "a", "a", "z"], 40, false);

        let started = std::time::Instant::now();
        let field = score(&query, tokens);
        assert!(field.spans.is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_unbounded_slop() {
        let tokens = vec![
            Token::new("a", 0, 1),
            Token::new("x", 2, 3),
            Token::new("b", 4, 5),
        ];
        let field = score(&Query::near(["a", "b"], u32::MAX, true), tokens.clone());
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 5, 1.0)]);

        let field = score(&Query::near(["b", "a"], u32::MAX, false), tokens);
        assert_eq!(field.spans, vec![WeightedSpan::new(0, 5, 1.0)]);
    }

    #[test]
    fn test_window_eviction_keeps_far_terms_apart() {
        let mut tokens = vec![Token::new("a", 0, 1)];
        for i in 0..10 {
            let start = 2 + i * 2;
            tokens.push(Token::new("x", start, start + 1));
        }
        tokens.push(Token::new("b", 22, 23));
        let field = score(&Query::near(["a", "b"], 3, true), tokens);
        assert!(field.spans.is_empty());
    }
}
