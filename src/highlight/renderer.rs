//! Rendering a fragment into marked-up text.

use std::fmt;
use std::sync::Arc;

use crate::highlight::fragmenter::Fragment;
use crate::highlight::markup::{Encoder, Formatter, default_encode, tag_formatter};
use crate::highlight::scorer::WeightedSpan;

/// A maximal non-overlapping highlighted range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightRegion {
    pub start: usize,
    pub end: usize,
    /// Maximum weight of the spans merged into the region.
    pub weight: f32,
}

/// Clip spans to `[start, end)` and merge overlapping ones into regions.
///
/// Spans that merely touch (one ends where the next starts) stay separate.
pub fn merge_spans(spans: &[WeightedSpan], start: usize, end: usize) -> Vec<HighlightRegion> {
    let mut clipped: Vec<HighlightRegion> = spans
        .iter()
        .map(|span| HighlightRegion {
            start: span.start.max(start),
            end: span.end.min(end),
            weight: span.weight,
        })
        .filter(|region| region.start < region.end)
        .collect();
    clipped.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));

    let mut merged: Vec<HighlightRegion> = Vec::with_capacity(clipped.len());
    for region in clipped {
        match merged.last_mut() {
            Some(last) if region.start < last.end => {
                last.end = last.end.max(region.end);
                last.weight = last.weight.max(region.weight);
            }
            _ => merged.push(region),
        }
    }
    merged
}

/// Writes fragments out through an encoder and a formatter.
#[derive(Clone)]
pub struct Renderer {
    encoder: Arc<Encoder>,
    formatter: Arc<Formatter>,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(Arc::new(default_encode), tag_formatter("<B>", "</B>"))
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("encoder", &"<dyn Fn>")
            .field("formatter", &"<dyn Fn>")
            .finish()
    }
}

impl Renderer {
    pub fn new(encoder: Arc<Encoder>, formatter: Arc<Formatter>) -> Self {
        Renderer { encoder, formatter }
    }

    pub fn encoder(&self) -> Arc<Encoder> {
        Arc::clone(&self.encoder)
    }

    pub fn formatter(&self) -> Arc<Formatter> {
        Arc::clone(&self.formatter)
    }

    /// Render one fragment of `text`.
    ///
    /// Offsets that do not land on character boundaries are rendered as empty
    /// runs instead of panicking; the highlighter rejects such input earlier.
    pub fn render(&self, text: &str, fragment: &Fragment) -> String {
        let regions = merge_spans(&fragment.spans, fragment.start, fragment.end);
        let slice = |start: usize, end: usize| text.get(start..end).unwrap_or_default();

        let mut output = String::new();
        let mut cursor = fragment.start;
        for region in regions {
            if region.start > cursor {
                output.push_str(&(self.encoder)(slice(cursor, region.start)));
            }
            let encoded = (self.encoder)(slice(region.start, region.end));
            output.push_str(&(self.formatter)(&encoded, region.weight));
            cursor = region.end;
        }
        if cursor < fragment.end {
            output.push_str(&(self.encoder)(slice(cursor, fragment.end)));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::markup::html_encode;

    fn fragment(start: usize, end: usize, spans: Vec<WeightedSpan>) -> Fragment {
        Fragment {
            start,
            end,
            score: spans.iter().map(|span| span.weight).sum(),
            spans,
        }
    }

    #[test]
    fn test_merge_overlapping() {
        let spans = vec![
            WeightedSpan::new(4, 7, 1.0),
            WeightedSpan::new(0, 7, 2.0),
            WeightedSpan::new(7, 9, 1.0),
        ];
        let regions = merge_spans(&spans, 0, 20);
        assert_eq!(
            regions,
            vec![
                HighlightRegion { start: 0, end: 7, weight: 2.0 },
                HighlightRegion { start: 7, end: 9, weight: 1.0 },
            ]
        );
    }

    #[test]
    fn test_merge_clips_to_fragment() {
        let spans = vec![WeightedSpan::new(2, 12, 1.0), WeightedSpan::new(20, 25, 1.0)];
        let regions = merge_spans(&spans, 5, 15);
        assert_eq!(regions, vec![HighlightRegion { start: 5, end: 12, weight: 1.0 }]);
    }

    #[test]
    fn test_render_default() {
        let text = "the fox did not jump";
        let rendered = Renderer::default().render(
            text,
            &fragment(0, 20, vec![WeightedSpan::new(0, 7, 1.0), WeightedSpan::new(4, 7, 1.0)]),
        );
        assert_eq!(rendered, "<B>the fox</B> did not jump");
    }

    #[test]
    fn test_render_partial_fragment() {
        let text = "the fox did not jump";
        let rendered = Renderer::default().render(
            text,
            &fragment(8, 20, vec![WeightedSpan::new(12, 15, 1.0)]),
        );
        assert_eq!(rendered, "did <B>not</B> jump");
    }

    #[test]
    fn test_formatter_receives_encoded_text_and_weight() {
        let formatter: Arc<Formatter> =
            Arc::new(|text: &str, weight: f32| format!("[{text}:{weight}]"));
        let renderer = Renderer::new(Arc::new(html_encode), formatter);
        let text = "a<b & c";
        let rendered = renderer.render(text, &fragment(0, 7, vec![WeightedSpan::new(0, 3, 2.5)]));
        assert_eq!(rendered, "[a&lt;b:2.5] &amp; c");
    }
}
