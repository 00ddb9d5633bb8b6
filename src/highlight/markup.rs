//! Encoders and formatters used by the renderer.
//!
//! An encoder escapes raw document text. A formatter wraps the already encoded
//! text of a highlighted region and receives the region's weight, so it can
//! grade its markup by relevance.

use std::sync::Arc;

/// Escapes raw text before it is written out.
pub type Encoder = dyn Fn(&str) -> String + Send + Sync;

/// Marks up an encoded region given its weight.
pub type Formatter = dyn Fn(&str, f32) -> String + Send + Sync;

/// Identity encoder.
pub fn default_encode(text: &str) -> String {
    text.to_string()
}

/// Escape the HTML special characters `& < > " '`.
pub fn html_encode(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#x27;"),
            _ => encoded.push(c),
        }
    }
    encoded
}

/// A formatter wrapping every region in `pre`/`post`, ignoring its weight.
pub fn tag_formatter<P: Into<String>, Q: Into<String>>(pre: P, post: Q) -> Arc<Formatter> {
    let pre = pre.into();
    let post = post.into();
    Arc::new(move |text: &str, _weight: f32| format!("{pre}{text}{post}"))
}
