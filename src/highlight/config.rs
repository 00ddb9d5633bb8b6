//! Highlighting configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TermlightError};
use crate::highlight::fragmenter::FragmentOrder;

/// Configuration for text highlighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Tag wrapping highlighted regions (e.g., "B", "em", "mark").
    pub tag: String,
    /// CSS class to add to highlight tags.
    pub css_class: Option<String>,
    /// Maximum number of fragments to return.
    pub max_fragments: usize,
    /// Target length of each fragment in characters.
    pub fragment_size: usize,
    /// Separator between fragments.
    pub fragment_separator: String,
    /// Whether to return the leading fragment if nothing matched.
    pub return_entire_field_if_no_highlight: bool,
    /// Only the first `max_analyzed_chars` characters of the text are considered.
    pub max_analyzed_chars: usize,
    /// Order of the returned fragments.
    pub fragment_order: FragmentOrder,
    /// Escape HTML special characters in the output.
    pub html_escape: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            tag: "B".to_string(),
            css_class: None,
            max_fragments: 5,
            fragment_size: 150,
            fragment_separator: "...".to_string(),
            return_entire_field_if_no_highlight: false,
            max_analyzed_chars: 1_000_000,
            fragment_order: FragmentOrder::Score,
            html_escape: false,
        }
    }
}

impl HighlightConfig {
    /// Create a new highlight configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag for highlighting.
    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the CSS class for highlight tags.
    pub fn css_class<S: Into<String>>(mut self, css_class: S) -> Self {
        self.css_class = Some(css_class.into());
        self
    }

    /// Set the maximum number of fragments.
    pub fn max_fragments(mut self, max_fragments: usize) -> Self {
        self.max_fragments = max_fragments;
        self
    }

    /// Set the fragment size.
    pub fn fragment_size(mut self, fragment_size: usize) -> Self {
        self.fragment_size = fragment_size;
        self
    }

    /// Set the fragment separator.
    pub fn fragment_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.fragment_separator = separator.into();
        self
    }

    pub fn return_entire_field_if_no_highlight(mut self, enabled: bool) -> Self {
        self.return_entire_field_if_no_highlight = enabled;
        self
    }

    pub fn max_analyzed_chars(mut self, max_analyzed_chars: usize) -> Self {
        self.max_analyzed_chars = max_analyzed_chars;
        self
    }

    pub fn fragment_order(mut self, order: FragmentOrder) -> Self {
        self.fragment_order = order;
        self
    }

    pub fn html_escape(mut self, enabled: bool) -> Self {
        self.html_escape = enabled;
        self
    }

    /// Build the opening tag.
    pub fn opening_tag(&self) -> String {
        if let Some(ref css_class) = self.css_class {
            format!("<{} class=\"{}\">", self.tag, css_class)
        } else {
            format!("<{}>", self.tag)
        }
    }

    /// Build the closing tag.
    pub fn closing_tag(&self) -> String {
        format!("</{}>", self.tag)
    }

    /// Check the configuration before any work is done with it.
    pub fn validate(&self) -> Result<()> {
        if self.max_fragments == 0 {
            return Err(TermlightError::invalid_fragment_request(
                "max_fragments must be at least 1",
            ));
        }
        if self.fragment_size == 0 {
            return Err(TermlightError::invalid_fragment_request(
                "fragment_size must be at least 1",
            ));
        }
        if self.max_analyzed_chars == 0 {
            return Err(TermlightError::invalid_config(
                "max_analyzed_chars must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HighlightConfig::default();
        assert_eq!(config.opening_tag(), "<B>");
        assert_eq!(config.closing_tag(), "</B>");
        assert_eq!(config.fragment_separator, "...");
        assert_eq!(config.max_fragments, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_css_class() {
        let config = HighlightConfig::new().tag("mark").css_class("hit");
        assert_eq!(config.opening_tag(), "<mark class=\"hit\">");
        assert_eq!(config.closing_tag(), "</mark>");
    }

    #[test]
    fn test_validate() {
        let err = HighlightConfig::new().max_fragments(0).validate().unwrap_err();
        assert!(matches!(err, TermlightError::InvalidFragmentRequest(_)));

        let err = HighlightConfig::new().fragment_size(0).validate().unwrap_err();
        assert!(matches!(err, TermlightError::InvalidFragmentRequest(_)));

        assert!(HighlightConfig::new().max_analyzed_chars(0).validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: HighlightConfig =
            serde_json::from_str(r#"{"fragment_size": 40, "fragment_order": "document"}"#).unwrap();
        assert_eq!(config.fragment_size, 40);
        assert_eq!(config.fragment_order, FragmentOrder::Document);
        assert_eq!(config.tag, "B");
    }
}
