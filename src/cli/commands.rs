//! Command implementations for the termlight CLI.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{Result, TermlightError};
use crate::highlight::config::HighlightConfig;
use crate::highlight::fragmenter::FragmentOrder;
use crate::highlight::highlighter::Highlighter;
use crate::query::clause::Query;
use crate::term_vector::stream::TermVectorTokenStream;
use crate::term_vector::terms::{TermVectorSource, TermVectors};

/// Execute a CLI command.
pub fn execute_command(args: TermlightArgs) -> Result<()> {
    match &args.command {
        Command::Tokens(tokens_args) => {
            let result = rebuild_tokens(tokens_args)?;
            output_result("Token stream rebuilt", &result, &args)
        }
        Command::Highlight(highlight_args) => {
            let result = highlight_text(highlight_args)?;
            output_result("Highlighting finished", &result, &args)
        }
    }
}

/// Rebuild the token stream of one field.
pub fn rebuild_tokens(args: &TokensArgs) -> Result<TokensResult> {
    let vectors: TermVectors = load_json(&args.term_vectors)?;
    let field = resolve_field(&vectors, args.field.as_deref())?;
    let vector = vectors
        .field(&field)
        .ok_or_else(|| TermlightError::field_not_found(field.as_str()))?;

    let stream = match args.max_start_offset {
        Some(limit) => TermVectorTokenStream::with_max_start_offset(vector, limit)?,
        None => TermVectorTokenStream::new(vector)?,
    };
    let tokens: Vec<_> = stream.collect();
    info!("rebuilt {} tokens for field '{}'", tokens.len(), field);

    Ok(TokensResult { field, tokens })
}

/// Highlight a text file against a query file.
pub fn highlight_text(args: &HighlightArgs) -> Result<HighlightResult> {
    let vectors: TermVectors = load_json(&args.term_vectors)?;
    let query: Query = load_json(&args.query)?;
    let text = fs::read_to_string(&args.text)?;
    let field = resolve_field(&vectors, args.field.as_deref())?;
    let config = build_config(args)?;

    debug!("highlighting field '{}' with {:?}", field, config);
    let separator = config.fragment_separator.clone();
    let highlighter = Highlighter::for_field(&query, &field, config)?;
    let highlight = highlighter.highlight_field(&vectors, &field, &text)?;
    info!(
        "field '{}': {} fragments",
        highlight.field_name,
        highlight.fragments.len()
    );

    Ok(HighlightResult {
        combined: highlight.combined_text(&separator),
        highlight,
    })
}

fn build_config(args: &HighlightArgs) -> Result<HighlightConfig> {
    let mut config = match &args.config {
        Some(path) => load_json(path)?,
        None => HighlightConfig::default(),
    };
    if let Some(fragment_size) = args.fragment_size {
        config = config.fragment_size(fragment_size);
    }
    if let Some(max_fragments) = args.max_fragments {
        config = config.max_fragments(max_fragments);
    }
    if let Some(separator) = &args.separator {
        config = config.fragment_separator(separator.as_str());
    }
    if args.html_escape {
        config = config.html_escape(true);
    }
    if args.document_order {
        config = config.fragment_order(FragmentOrder::Document);
    }
    config.validate()?;
    Ok(config)
}

/// The requested field, or the first field of the source.
fn resolve_field<S: TermVectorSource + ?Sized>(source: &S, requested: Option<&str>) -> Result<String> {
    match requested {
        Some(field) => Ok(field.to_string()),
        None => source
            .field_names()
            .first()
            .map(|name| name.to_string())
            .ok_or_else(|| TermlightError::other("term vectors file contains no fields")),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("loading {}", path.display());
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()).into())
}
