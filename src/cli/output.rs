//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::cli::args::{OutputFormat, TermlightArgs};
use crate::error::Result;
use crate::highlight::highlighter::FieldHighlight;

/// Result structure for the `tokens` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensResult {
    pub field: String,
    pub tokens: Vec<Token>,
}

impl fmt::Display for TokensResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tokens of '{}':", self.field)?;
        writeln!(f, "═══════════════")?;
        for token in &self.tokens {
            write!(
                f,
                "{:<20} [{}, {}) +{}",
                token.text, token.start_offset, token.end_offset, token.position_increment
            )?;
            if let Some(payload) = &token.payload {
                write!(f, " payload={payload:?}")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        write!(f, "Total tokens: {}", self.tokens.len())
    }
}

/// Result structure for the `highlight` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightResult {
    #[serde(flatten)]
    pub highlight: FieldHighlight,
    /// Fragments joined with the configured separator.
    pub combined: String,
}

impl fmt::Display for HighlightResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Highlights of '{}':", self.highlight.field_name)?;
        writeln!(f, "═══════════════")?;
        if self.highlight.fragments.is_empty() {
            return write!(f, "No matches");
        }
        for (i, fragment) in self.highlight.fragments.iter().enumerate() {
            writeln!(f)?;
            writeln!(
                f,
                "Fragment {}: [{}, {}) (Score: {:.3})",
                i + 1,
                fragment.start_offset,
                fragment.end_offset,
                fragment.score
            )?;
            writeln!(f, "─────────────")?;
            writeln!(f, "{}", fragment.text)?;
        }
        if self.highlight.is_entire_field {
            writeln!(f)?;
            write!(f, "(no matches, leading fragment shown)")?;
        }
        Ok(())
    }
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &TermlightArgs) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: fmt::Display>(message: &str, result: &T, args: &TermlightArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    println!("{result}");
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &TermlightArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::highlighter::HighlightFragment;

    #[test]
    fn test_tokens_display() {
        let result = TokensResult {
            field: "body".to_string(),
            tokens: vec![
                Token::new("the", 0, 3),
                Token::new("{fox}", 0, 7).with_position_increment(0),
            ],
        };
        let text = result.to_string();
        assert!(text.contains("Tokens of 'body':"));
        assert!(text.contains("{fox}"));
        assert!(text.contains("[0, 7) +0"));
        assert!(text.ends_with("Total tokens: 2"));
    }

    #[test]
    fn test_highlight_json_is_flat() {
        let mut highlight = FieldHighlight::new("body");
        highlight.add_fragment(HighlightFragment::new("<B>fox</B>".into(), 0, 3, 1.0));
        let result = HighlightResult {
            combined: highlight.combined_text("..."),
            highlight,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["field_name"], "body");
        assert_eq!(value["combined"], "<B>fox</B>");
        assert_eq!(value["fragments"][0]["start_offset"], 0);
        assert!(result.to_string().contains("Fragment 1: [0, 3) (Score: 1.000)"));
    }

    #[test]
    fn test_empty_highlight_display() {
        let result = HighlightResult {
            highlight: FieldHighlight::new("body"),
            combined: String::new(),
        };
        assert!(result.to_string().ends_with("No matches"));
    }
}
