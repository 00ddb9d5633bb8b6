//! Interleaving of per-term occurrence lists into document order.
//!
//! A term vector keeps each term's occurrences together, sorted by offset
//! within the term. [`OccurrenceMerger`] turns that back into one token
//! sequence ordered by start offset, the way the tokens originally left the
//! analyzer.
//!
//! Preparation copies the occurrence coordinates into a flat arena of
//! [`Slot`]s (one contiguous range per term) and validates them; merging is a
//! k-way merge driven by a min-heap holding one cursor per term. Ties between
//! co-located tokens are broken by end offset, then term text, so the output
//! never depends on the order in which term entries were supplied.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use crate::analysis::token::{Token, TokenAttributes};
use crate::error::{Result, TermlightError};
use crate::term_vector::terms::FieldTermVector;

/// Arena record for one occurrence.
#[derive(Clone, Copy, Debug)]
struct Slot {
    start: u32,
    end: u32,
    position: Option<u32>,
    /// Index of the occurrence inside its term entry (for payload lookup).
    occurrence: usize,
}

/// The arena range belonging to one term.
#[derive(Clone, Copy, Debug)]
struct TermRange {
    /// Index of the term entry in the field term vector.
    entry: usize,
    begin: usize,
    end: usize,
}

/// Head of one term's remaining occurrences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    start: u32,
    end: u32,
    /// Rank of the term in term-text order (index into `ranges`).
    rank: usize,
    slot: usize,
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: smaller offsets come first, then lower term rank
        other
            .start
            .cmp(&self.start)
            .then_with(|| other.end.cmp(&self.end))
            .then_with(|| other.rank.cmp(&self.rank))
            .then_with(|| other.slot.cmp(&self.slot))
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// K-way merge of a field's term occurrences into offset order.
#[derive(Debug)]
pub struct OccurrenceMerger<'a> {
    vector: &'a FieldTermVector,
    slots: Vec<Slot>,
    /// Term ranges, ordered by term text.
    ranges: Vec<TermRange>,
    heap: BinaryHeap<Cursor>,
    last_position: i64,
    last_start: Option<u32>,
}

impl<'a> OccurrenceMerger<'a> {
    /// Prepare a merge over every occurrence of the field.
    ///
    /// Fails with [`TermlightError::MissingOffsets`] before producing anything
    /// when the field has no offsets or any occurrence lacks one.
    pub fn new(vector: &'a FieldTermVector) -> Result<Self> {
        Self::with_max_start_offset(vector, None)
    }

    /// Prepare a merge, dropping occurrences that start after `max_start_offset`.
    pub fn with_max_start_offset(
        vector: &'a FieldTermVector,
        max_start_offset: Option<u32>,
    ) -> Result<Self> {
        let flags = vector.flags();
        if !flags.offsets {
            return Err(TermlightError::missing_offsets(vector.field()));
        }

        let entries = vector.terms();
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&a, &b| entries[a].term.cmp(&entries[b].term));

        let mut slots = Vec::with_capacity(vector.total_occurrences());
        let mut ranges = Vec::with_capacity(entries.len());

        for entry_index in order {
            let entry = &entries[entry_index];
            let begin = slots.len();

            for (i, occurrence) in entry.occurrences.iter().enumerate() {
                let (Some(start), Some(end)) = (occurrence.start_offset, occurrence.end_offset)
                else {
                    return Err(TermlightError::missing_offsets(vector.field()));
                };
                if start > end {
                    return Err(TermlightError::invalid_term_vector(format!(
                        "term '{}' in field '{}' has start offset {} after end offset {}",
                        entry.term,
                        vector.field(),
                        start,
                        end
                    )));
                }
                if max_start_offset.is_some_and(|max| start > max) {
                    continue;
                }
                slots.push(Slot {
                    start,
                    end,
                    position: if flags.positions {
                        occurrence.position
                    } else {
                        None
                    },
                    occurrence: i,
                });
            }

            let term_slots = &mut slots[begin..];
            if !term_slots.is_sorted_by_key(|slot| (slot.start, slot.end)) {
                term_slots.sort_by_key(|slot| (slot.start, slot.end));
            }

            if slots.len() > begin {
                ranges.push(TermRange {
                    entry: entry_index,
                    begin,
                    end: slots.len(),
                });
            }
        }

        debug!(
            "prepared term vector merge for field '{}': {} terms, {} occurrences",
            vector.field(),
            ranges.len(),
            slots.len()
        );

        let mut merger = OccurrenceMerger {
            vector,
            slots,
            ranges,
            heap: BinaryHeap::new(),
            last_position: -1,
            last_start: None,
        };
        merger.reset();
        Ok(merger)
    }

    /// Restart the merge from the first token.
    pub fn reset(&mut self) {
        self.heap.clear();
        for (rank, range) in self.ranges.iter().enumerate() {
            let slot = &self.slots[range.begin];
            self.heap.push(Cursor {
                start: slot.start,
                end: slot.end,
                rank,
                slot: range.begin,
            });
        }
        self.last_position = -1;
        self.last_start = None;
    }

    /// Attributes carried by the produced tokens.
    pub fn attributes(&self) -> TokenAttributes {
        let flags = self.vector.flags();
        TokenAttributes {
            offsets: true,
            positions: flags.positions,
            payloads: flags.payloads,
        }
    }

    /// The field being merged.
    pub fn field(&self) -> &str {
        self.vector.field()
    }

    /// Total number of tokens one full pass yields.
    pub fn token_count(&self) -> usize {
        self.slots.len()
    }
}

impl Iterator for OccurrenceMerger<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let cursor = self.heap.pop()?;
        let range = self.ranges[cursor.rank];
        let slot = self.slots[cursor.slot];

        let next_slot = cursor.slot + 1;
        if next_slot < range.end {
            let next = &self.slots[next_slot];
            self.heap.push(Cursor {
                start: next.start,
                end: next.end,
                rank: cursor.rank,
                slot: next_slot,
            });
        }

        // Without a stored position, a token shares its predecessor's position
        // when it starts at the same offset and advances by one otherwise.
        let position = match slot.position {
            Some(position) => position as i64,
            None if self.last_start == Some(slot.start) => self.last_position.max(0),
            None => self.last_position + 1,
        };
        let increment = (position - self.last_position).max(0) as usize;
        self.last_position = self.last_position.max(position);
        self.last_start = Some(slot.start);

        let entry = &self.vector.terms()[range.entry];
        let payload = if self.vector.flags().payloads {
            entry.occurrences[slot.occurrence].payload.clone()
        } else {
            None
        };

        Some(Token {
            text: entry.term.clone(),
            start_offset: slot.start as usize,
            end_offset: slot.end as usize,
            position_increment: increment,
            payload,
        })
    }
}
