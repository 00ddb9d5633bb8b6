//! Query tree consumed by the highlighter.
//!
//! The highlighter does not parse query strings; it walks an already built
//! [`Query`]. The clause set is closed: single terms, phrases (positional
//! constraints), boosts, disjunctions and boolean combinations.
//!
//! Queries can be (de)serialized as JSON:
//!
//! ```
//! use termlight::query::Query;
//!
//! let query: Query = serde_json::from_str(
//!     r#"{"type": "disjunction", "clauses": [
//!         {"type": "term", "term": "fox"},
//!         {"type": "phrase", "terms": ["the", ["fox", "{fox}"]], "slop": 1}
//!     ]}"#,
//! ).unwrap();
//! assert!(matches!(query, Query::Disjunction { .. }));
//! ```

use serde::{Deserialize, Serialize};

fn default_in_order() -> bool {
    true
}

/// A query tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// A single term.
    Term(TermQuery),
    /// Terms that must occur within a positional distance of each other.
    Phrase(PhraseQuery),
    /// Multiplies every descendant weight by `boost`.
    Boosted { boost: f32, query: Box<Query> },
    /// Alternatives, each contributing its own weight.
    Disjunction { clauses: Vec<Query> },
    /// Boolean combination; prohibited clauses are never highlighted.
    Boolean { clauses: Vec<BooleanClause> },
}

impl Query {
    /// A term query on any field.
    pub fn term<S: Into<String>>(term: S) -> Self {
        Query::Term(TermQuery::new(term))
    }

    /// A term query bound to a field.
    pub fn field_term<F: Into<String>, S: Into<String>>(field: F, term: S) -> Self {
        Query::Term(TermQuery::new(term).with_field(field))
    }

    /// An exact, in-order phrase.
    pub fn phrase<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Phrase(PhraseQuery::new(terms))
    }

    /// Terms within `slop` positions of each other, optionally in order.
    pub fn near<I, S>(terms: I, slop: u32, in_order: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Phrase(PhraseQuery::new(terms).with_slop(slop).in_order(in_order))
    }

    /// A disjunction of alternatives.
    pub fn disjunction(clauses: Vec<Query>) -> Self {
        Query::Disjunction { clauses }
    }

    /// A boolean combination.
    pub fn boolean(clauses: Vec<BooleanClause>) -> Self {
        Query::Boolean { clauses }
    }

    /// Wrap this query with a boost.
    pub fn boost(self, boost: f32) -> Self {
        Query::Boosted {
            boost,
            query: Box::new(self),
        }
    }
}

/// A single-term clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    /// Field the term belongs to; `None` matches any field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub term: String,
}

impl TermQuery {
    /// Create a new term query.
    pub fn new<S: Into<String>>(term: S) -> Self {
        TermQuery {
            field: None,
            term: term.into(),
        }
    }

    /// Bind the query to a field.
    pub fn with_field<F: Into<String>>(mut self, field: F) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// One position of a phrase: a single term or interchangeable alternatives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhraseTerm {
    One(String),
    Any(Vec<String>),
}

impl PhraseTerm {
    /// Terms accepted at this position.
    pub fn alternatives(&self) -> &[String] {
        match self {
            PhraseTerm::One(term) => std::slice::from_ref(term),
            PhraseTerm::Any(terms) => terms,
        }
    }
}

/// A positional clause: terms within `slop` positions of each other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhraseQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub terms: Vec<PhraseTerm>,
    /// Maximum number of extra positions allowed between the terms.
    #[serde(default)]
    pub slop: u32,
    /// Whether the terms must appear in the given order.
    #[serde(default = "default_in_order")]
    pub in_order: bool,
}

impl PhraseQuery {
    /// Create an exact, in-order phrase.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PhraseQuery {
            field: None,
            terms: terms
                .into_iter()
                .map(|term| PhraseTerm::One(term.into()))
                .collect(),
            slop: 0,
            in_order: true,
        }
    }

    /// Append a position accepting any of the given terms.
    pub fn add_alternatives<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .push(PhraseTerm::Any(terms.into_iter().map(Into::into).collect()));
        self
    }

    /// Set the slop.
    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    /// Set whether order matters.
    pub fn in_order(mut self, in_order: bool) -> Self {
        self.in_order = in_order;
        self
    }

    /// Bind the phrase to a field.
    pub fn with_field<F: Into<String>>(mut self, field: F) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Occurrence requirement of a boolean clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

/// A clause of a boolean query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    pub occur: Occur,
    pub query: Query,
}

impl BooleanClause {
    pub fn must(query: Query) -> Self {
        BooleanClause {
            occur: Occur::Must,
            query,
        }
    }

    pub fn should(query: Query) -> Self {
        BooleanClause {
            occur: Occur::Should,
            query,
        }
    }

    pub fn must_not(query: Query) -> Self {
        BooleanClause {
            occur: Occur::MustNot,
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let query = Query::near(["quick", "fox"], 2, false).boost(3.0);
        match query {
            Query::Boosted { boost, query } => {
                assert_eq!(boost, 3.0);
                match *query {
                    Query::Phrase(phrase) => {
                        assert_eq!(phrase.slop, 2);
                        assert!(!phrase.in_order);
                        assert_eq!(phrase.terms.len(), 2);
                    }
                    other => panic!("unexpected query {other:?}"),
                }
            }
            other => panic!("unexpected query {other:?}"),
        }
    }

    #[test]
    fn test_phrase_alternatives() {
        let phrase = PhraseQuery::new(["the"]).add_alternatives(["fox", "{fox}"]);
        assert_eq!(phrase.terms[0].alternatives(), ["the".to_string()]);
        assert_eq!(phrase.terms[1].alternatives().len(), 2);
    }

    #[test]
    fn test_json_shapes() {
        let query: Query = serde_json::from_str(
            r#"{"type": "boolean", "clauses": [
                {"occur": "must", "query": {"type": "term", "term": "fox", "field": "body"}},
                {"occur": "must_not", "query": {"type": "term", "term": "dog"}},
                {"occur": "should", "query": {"type": "boosted", "boost": 2.0,
                    "query": {"type": "phrase", "terms": ["lazy", "dog"], "in_order": false}}}
            ]}"#,
        )
        .unwrap();

        let Query::Boolean { clauses } = &query else {
            panic!("expected boolean query");
        };
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].query, Query::field_term("body", "fox"));
        assert_eq!(clauses[1].occur, Occur::MustNot);

        let json = serde_json::to_string(&query).unwrap();
        let parsed: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_phrase_defaults() {
        let query: Query = serde_json::from_str(r#"{"type": "phrase", "terms": ["a", "b"]}"#).unwrap();
        let Query::Phrase(phrase) = query else {
            panic!("expected phrase query");
        };
        assert_eq!(phrase.slop, 0);
        assert!(phrase.in_order);
    }
}
