//! Specification splitting
//!
//! Fans a multi-line specification out into one specification per counter
//! line, for harnesses that must run each line as a separate job.

use perfmux_shared::error::ParseError;
use perfmux_shared::types::spec::{render_counter_line, render_spec};

use crate::parse::SpecDocument;

/// One isolated specification per counter line of `text`, each carrying the
/// directives of `text`
pub fn split_spec(text: &str) -> Result<Vec<String>, ParseError> {
    let doc = SpecDocument::parse(text)?;
    Ok(doc
        .lines
        .iter()
        .map(|line| render_spec(&[render_counter_line(&line.tokens)], &doc.directives))
        .collect())
}
