//! Term vector records: per-field, per-term occurrence lists.
//!
//! A term vector stores a field's tokens grouped *by term*: for each distinct
//! term, the list of its occurrences with optional position, offsets and
//! payload. Which of those attributes were kept is described once per field by
//! [`TermVectorFlags`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::error::{Result, TermlightError};

/// Which optional attributes a field's term vector stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermVectorFlags {
    /// Absolute token positions were stored.
    #[serde(default)]
    pub positions: bool,
    /// Start/end offsets were stored.
    #[serde(default)]
    pub offsets: bool,
    /// Payload bytes were stored.
    #[serde(default)]
    pub payloads: bool,
}

impl TermVectorFlags {
    /// Offsets only.
    pub fn offsets() -> Self {
        TermVectorFlags {
            positions: false,
            offsets: true,
            payloads: false,
        }
    }

    /// Positions and offsets.
    pub fn positions_and_offsets() -> Self {
        TermVectorFlags {
            positions: true,
            offsets: true,
            payloads: false,
        }
    }

    /// Positions, offsets and payloads.
    pub fn all() -> Self {
        TermVectorFlags {
            positions: true,
            offsets: true,
            payloads: true,
        }
    }

    /// Positions only, without offsets.
    pub fn positions() -> Self {
        TermVectorFlags {
            positions: true,
            offsets: false,
            payloads: false,
        }
    }
}

/// One stored occurrence of a term.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl Occurrence {
    /// Occurrence with offsets only.
    pub fn with_offsets(start_offset: u32, end_offset: u32) -> Self {
        Occurrence {
            position: None,
            start_offset: Some(start_offset),
            end_offset: Some(end_offset),
            payload: None,
        }
    }

    /// Set the position.
    pub fn at_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach payload bytes.
    pub fn with_payload<P: Into<Vec<u8>>>(mut self, payload: P) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// All occurrences of one term within a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermVectorEntry {
    pub term: String,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

impl TermVectorEntry {
    /// Create an entry without occurrences.
    pub fn new<S: Into<String>>(term: S) -> Self {
        TermVectorEntry {
            term: term.into(),
            occurrences: Vec::new(),
        }
    }

    /// Append an occurrence.
    pub fn push(&mut self, occurrence: Occurrence) {
        self.occurrences.push(occurrence);
    }

    /// Number of occurrences of the term in the field.
    pub fn frequency(&self) -> u32 {
        self.occurrences.len() as u32
    }
}

/// The term vector of a single field of a single document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTermVector {
    field: String,
    #[serde(default)]
    flags: TermVectorFlags,
    #[serde(default)]
    terms: Vec<TermVectorEntry>,
}

impl FieldTermVector {
    /// Create an empty term vector for a field.
    pub fn new<S: Into<String>>(field: S, flags: TermVectorFlags) -> Self {
        FieldTermVector {
            field: field.into(),
            flags,
            terms: Vec::new(),
        }
    }

    /// Build a term vector from an analyzed token sequence.
    ///
    /// Tokens are grouped by term, keeping only the attributes enabled in
    /// `flags`. Absolute positions are derived from the position increments,
    /// starting at 0 for a first token with increment 1.
    ///
    /// Stored positions and offsets are 32-bit. A token whose offset or
    /// position does not fit fails with [`TermlightError::InvalidTermVector`].
    pub fn from_tokens<S, I>(field: S, tokens: I, flags: TermVectorFlags) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = Token>,
    {
        let mut grouped: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();
        let mut position: i64 = -1;

        for token in tokens {
            position += token.position_increment as i64;
            let occurrence = Occurrence {
                position: if flags.positions {
                    Some(stored_u32(position.max(0), "position", &token.text)?)
                } else {
                    None
                },
                start_offset: if flags.offsets {
                    Some(stored_u32(token.start_offset, "start offset", &token.text)?)
                } else {
                    None
                },
                end_offset: if flags.offsets {
                    Some(stored_u32(token.end_offset, "end offset", &token.text)?)
                } else {
                    None
                },
                payload: if flags.payloads { token.payload } else { None },
            };
            grouped.entry(token.text).or_default().push(occurrence);
        }

        Ok(FieldTermVector {
            field: field.into(),
            flags,
            terms: grouped
                .into_iter()
                .map(|(term, occurrences)| TermVectorEntry { term, occurrences })
                .collect(),
        })
    }

    /// Add one occurrence of a term, keeping entries sorted by term text.
    pub fn add_occurrence<S: AsRef<str>>(&mut self, term: S, occurrence: Occurrence) {
        let term = term.as_ref();
        match self
            .terms
            .binary_search_by(|entry| entry.term.as_str().cmp(term))
        {
            Ok(index) => self.terms[index].push(occurrence),
            Err(index) => {
                let mut entry = TermVectorEntry::new(term);
                entry.push(occurrence);
                self.terms.insert(index, entry);
            }
        }
    }

    /// Add a complete entry as-is.
    pub fn push_entry(&mut self, entry: TermVectorEntry) {
        self.terms.push(entry);
    }

    /// Name of the field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Stored attribute flags.
    pub fn flags(&self) -> TermVectorFlags {
        self.flags
    }

    /// All term entries.
    pub fn terms(&self) -> &[TermVectorEntry] {
        &self.terms
    }

    /// Look up a term entry.
    pub fn term(&self, term: &str) -> Option<&TermVectorEntry> {
        self.terms.iter().find(|entry| entry.term == term)
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the field has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Total number of occurrences across all terms.
    pub fn total_occurrences(&self) -> usize {
        self.terms.iter().map(|entry| entry.occurrences.len()).sum()
    }
}

/// Something that can hand out term vectors by field name.
pub trait TermVectorSource {
    /// The term vector of a field, if one was stored.
    fn field(&self, name: &str) -> Option<&FieldTermVector>;

    /// Names of all fields with term vectors.
    fn field_names(&self) -> Vec<&str>;
}

/// Term vectors of all fields of one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermVectors {
    #[serde(default)]
    fields: Vec<FieldTermVector>,
}

impl TermVectors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field's term vector.
    pub fn add_field(&mut self, vector: FieldTermVector) {
        match self
            .fields
            .iter_mut()
            .find(|existing| existing.field == vector.field)
        {
            Some(existing) => *existing = vector,
            None => self.fields.push(vector),
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TermVectorSource for TermVectors {
    fn field(&self, name: &str) -> Option<&FieldTermVector> {
        self.fields.iter().find(|vector| vector.field == name)
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|vector| vector.field.as_str()).collect()
    }
}

impl TermVectorSource for FieldTermVector {
    fn field(&self, name: &str) -> Option<&FieldTermVector> {
        (self.field == name).then_some(self)
    }

    fn field_names(&self) -> Vec<&str> {
        vec![self.field.as_str()]
    }
}

fn stored_u32<T>(value: T, what: &str, term: &str) -> Result<u32>
where
    T: TryInto<u32> + Copy + std::fmt::Display,
{
    value.try_into().map_err(|_| {
        TermlightError::invalid_term_vector(format!(
            "{what} {value} of term '{term}' does not fit in 32 bits"
        ))
    })
}
