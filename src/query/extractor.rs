//! Flattening of a query tree into per-term weights and positional constraints.
//!
//! Extraction happens once per query. The resulting [`WeightedQuery`] does not
//! depend on any document and is never mutated afterwards, so a single
//! instance can be shared (by reference or `Arc`) across every document and
//! thread that highlights against the query.

use ahash::{AHashMap, AHashSet};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TermlightError};
use crate::query::clause::{Occur, PhraseQuery, Query};

/// Weight information for one term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    /// Sum of every contribution the term receives, positional ones included.
    pub weight: f32,
    /// Portion of the weight that applies to any occurrence of the term.
    pub unconditional_weight: f32,
    /// The term takes part in at least one positional constraint.
    pub requires_positional_verification: bool,
}

/// A phrase-like constraint that term weights alone cannot express.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionalConstraint {
    /// Accepted terms per phrase position, in phrase order.
    pub slots: Vec<Vec<String>>,
    pub slop: u32,
    pub in_order: bool,
    pub weight: f32,
}

impl PositionalConstraint {
    /// Widest position distance a match can cover.
    pub fn window(&self) -> u32 {
        (self.slots.len() as u32)
            .saturating_sub(1)
            .saturating_add(self.slop)
    }

    /// Whether `term` may fill slot `slot`.
    pub fn accepts(&self, slot: usize, term: &str) -> bool {
        self.slots[slot].iter().any(|candidate| candidate == term)
    }
}

/// Immutable result of query extraction.
#[derive(Clone, Debug, Default)]
pub struct WeightedQuery {
    terms: AHashMap<String, WeightedTerm>,
    constraints: Vec<PositionalConstraint>,
    constraints_by_term: AHashMap<String, Vec<usize>>,
    max_window: u32,
}

impl WeightedQuery {
    /// Extract weights from a query, regardless of field.
    pub fn extract(query: &Query) -> Result<Self> {
        Self::extract_for_field(query, None)
    }

    /// Extract weights from a query, ignoring leaves bound to another field.
    ///
    /// The whole tree is validated first, so a malformed query is rejected
    /// even when the offending clause belongs to another field.
    pub fn extract_for_field(query: &Query, field: Option<&str>) -> Result<Self> {
        validate(query)?;

        let mut extractor = Extractor {
            field,
            terms: AHashMap::new(),
            constraints: Vec::new(),
        };
        extractor.collect(query, 1.0)?;

        let mut constraints_by_term: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (index, constraint) in extractor.constraints.iter().enumerate() {
            let mut seen = AHashSet::new();
            for term in constraint.slots.iter().flatten() {
                if seen.insert(term.as_str()) {
                    constraints_by_term
                        .entry(term.clone())
                        .or_default()
                        .push(index);
                }
            }
        }
        let max_window = extractor
            .constraints
            .iter()
            .map(PositionalConstraint::window)
            .max()
            .unwrap_or(0);

        trace!(
            "extracted {} weighted terms and {} positional constraints",
            extractor.terms.len(),
            extractor.constraints.len()
        );

        Ok(WeightedQuery {
            terms: extractor.terms,
            constraints: extractor.constraints,
            constraints_by_term,
            max_window,
        })
    }

    /// Weight information for a term.
    pub fn get(&self, term: &str) -> Option<&WeightedTerm> {
        self.terms.get(term)
    }

    /// Weight applying to every occurrence of `term` (0 when absent).
    pub fn unconditional_weight(&self, term: &str) -> f32 {
        self.terms
            .get(term)
            .map(|weighted| weighted.unconditional_weight)
            .unwrap_or(0.0)
    }

    /// All weighted terms, in no particular order.
    pub fn terms(&self) -> impl Iterator<Item = &WeightedTerm> {
        self.terms.values()
    }

    /// All positional constraints.
    pub fn constraints(&self) -> &[PositionalConstraint] {
        &self.constraints
    }

    /// Indices of the constraints that mention `term`.
    pub fn constraints_for(&self, term: &str) -> &[usize] {
        self.constraints_by_term
            .get(term)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any constraint mentions `term`.
    pub fn is_constrained(&self, term: &str) -> bool {
        self.constraints_by_term.contains_key(term)
    }

    /// Widest window any constraint needs, in positions.
    pub fn max_window(&self) -> u32 {
        self.max_window
    }

    /// Largest total weight of any term.
    pub fn max_term_weight(&self) -> f32 {
        self.terms
            .values()
            .map(|weighted| weighted.weight)
            .fold(0.0, f32::max)
    }

    /// Number of distinct weighted terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether nothing in the query can match.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constraints.is_empty()
    }
}

fn validate_boost(boost: f32) -> Result<()> {
    if boost.is_finite() && boost >= 0.0 {
        Ok(())
    } else {
        Err(TermlightError::invalid_query(format!(
            "boost must be a finite non-negative number, got {boost}"
        )))
    }
}

fn validate_phrase(phrase: &PhraseQuery) -> Result<()> {
    if phrase.terms.is_empty() {
        return Err(TermlightError::invalid_query("phrase has no terms"));
    }
    for (index, slot) in phrase.terms.iter().enumerate() {
        let alternatives = slot.alternatives();
        if alternatives.is_empty() {
            return Err(TermlightError::invalid_query(format!(
                "phrase position {index} has no terms"
            )));
        }
        if alternatives.iter().any(String::is_empty) {
            return Err(TermlightError::invalid_query(format!(
                "phrase position {index} contains an empty term"
            )));
        }
    }
    Ok(())
}

fn validate(query: &Query) -> Result<()> {
    match query {
        Query::Term(term) => {
            if term.term.is_empty() {
                return Err(TermlightError::invalid_query("term query has an empty term"));
            }
            Ok(())
        }
        Query::Phrase(phrase) => validate_phrase(phrase),
        Query::Boosted { boost, query } => {
            validate_boost(*boost)?;
            validate(query)
        }
        Query::Disjunction { clauses } => {
            if clauses.is_empty() {
                return Err(TermlightError::invalid_query("disjunction has no clauses"));
            }
            clauses.iter().try_for_each(validate)
        }
        Query::Boolean { clauses } => {
            if clauses.is_empty() {
                return Err(TermlightError::invalid_query("boolean query has no clauses"));
            }
            clauses.iter().try_for_each(|clause| validate(&clause.query))
        }
    }
}

struct Extractor<'f> {
    field: Option<&'f str>,
    terms: AHashMap<String, WeightedTerm>,
    constraints: Vec<PositionalConstraint>,
}

impl Extractor<'_> {
    fn in_field(&self, field: Option<&str>) -> bool {
        match (self.field, field) {
            (Some(wanted), Some(field)) => wanted == field,
            _ => true,
        }
    }

    fn add_term(&mut self, term: &str, weight: f32, unconditional: bool) -> Result<()> {
        let entry = self
            .terms
            .entry(term.to_string())
            .or_insert_with(|| WeightedTerm {
                term: term.to_string(),
                weight: 0.0,
                unconditional_weight: 0.0,
                requires_positional_verification: false,
            });
        entry.weight += weight;
        if !entry.weight.is_finite() {
            return Err(TermlightError::invalid_query(format!(
                "weight of term '{term}' overflows"
            )));
        }
        if unconditional {
            entry.unconditional_weight += weight;
        } else {
            entry.requires_positional_verification = true;
        }
        Ok(())
    }

    fn collect(&mut self, query: &Query, boost: f32) -> Result<()> {
        match query {
            Query::Term(term) => {
                if self.in_field(term.field.as_deref()) {
                    self.add_term(&term.term, boost, true)?;
                }
            }
            Query::Phrase(phrase) => {
                if !self.in_field(phrase.field.as_deref()) {
                    return Ok(());
                }
                let slots: Vec<Vec<String>> = phrase
                    .terms
                    .iter()
                    .map(|slot| slot.alternatives().to_vec())
                    .collect();

                let mut seen = AHashSet::new();
                for term in slots.iter().flatten() {
                    if seen.insert(term.as_str()) {
                        self.add_term(term, boost, false)?;
                    }
                }

                self.constraints.push(PositionalConstraint {
                    slots,
                    slop: phrase.slop,
                    in_order: phrase.in_order,
                    weight: boost,
                });
            }
            Query::Boosted { boost: inner, query } => {
                let boost = boost * inner;
                if !boost.is_finite() {
                    return Err(TermlightError::invalid_query(format!(
                        "nested boosts overflow at boost {inner}"
                    )));
                }
                self.collect(query, boost)?;
            }
            Query::Disjunction { clauses } => {
                for clause in clauses {
                    self.collect(clause, boost)?;
                }
            }
            Query::Boolean { clauses } => {
                for clause in clauses {
                    if clause.occur != Occur::MustNot {
                        self.collect(&clause.query, boost)?;
                    }
                }
            }
        }
        Ok(())
    }
}
