//! Counter specification parser
//!
//! Turns raw specification text into counter tokens, classifies each token
//! by block and channel, and separates level counters from ordinary ones.

use perfmux_shared::error::ParseError;
use perfmux_shared::types::arch::Block;
use perfmux_shared::types::counter::{LevelCounter, ACCUMULATOR_COUNTER};
use perfmux_shared::types::spec::{render_counter_line, strip_comment, Directives, COUNTER_MARKER};
use tracing::debug;

/// Block prefix that shares counter slots with SQ
const LEGACY_SQ_PREFIX: &str = "SQC";

/// Counter tokens of one raw line.
///
/// Returns `Ok(None)` for blank, comment-only and non-counter lines.
pub fn parse_counter_line(raw: &str, line: usize) -> Result<Option<Vec<String>>, ParseError> {
    let text = strip_comment(raw);
    let Some(rest) = text.strip_prefix(COUNTER_MARKER) else {
        return Ok(None);
    };

    let tokens: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return Err(ParseError::EmptyCounterList { line });
    }
    Ok(Some(tokens))
}

/// A counter token with its block prefix and channel resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterToken {
    pub name: String,

    /// Uppercased block prefix, with SQC folded into SQ
    pub prefix: String,

    pub channel: Option<u32>,
}

/// Classify one counter token
pub fn parse_token(token: &str, line: usize) -> Result<CounterToken, ParseError> {
    let mut prefix = token.split('_').next().unwrap_or(token).to_uppercase();
    if prefix == LEGACY_SQ_PREFIX {
        prefix = Block::Sq.as_str().to_string();
    }

    let channel = if prefix == Block::Tcc.as_str() {
        parse_channel(token, line)?
    } else {
        None
    };

    Ok(CounterToken {
        name: token.to_string(),
        prefix,
        channel,
    })
}

/// Channel index from a trailing `[n]`
fn parse_channel(token: &str, line: usize) -> Result<Option<u32>, ParseError> {
    let Some(open) = token.find('[') else {
        return Ok(None);
    };
    let malformed = || ParseError::MalformedChannel {
        line,
        token: token.to_string(),
    };

    let digits = token[open + 1..].strip_suffix(']').ok_or_else(malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    digits.parse().map(Some).map_err(|_| malformed())
}

/// Tokens of one line after level counters were pulled out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCounters {
    pub ordinary: Vec<String>,
    pub levels: Vec<LevelCounter>,
}

/// Separate level counters (a token directly followed by the accumulator)
/// from the ordinary tokens of a line
pub fn split_levels(tokens: &[String], line: usize) -> Result<LineCounters, ParseError> {
    let mut out = LineCounters::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == ACCUMULATOR_COUNTER {
            return Err(ParseError::DanglingAccumulator { line });
        }
        if tokens.get(i + 1).map(String::as_str) == Some(ACCUMULATOR_COUNTER) {
            out.levels
                .push(LevelCounter::new(token.as_str()).with_line(render_counter_line(tokens)));
            i += 2;
            continue;
        }
        out.ordinary.push(token.clone());
        i += 1;
    }
    Ok(out)
}

/// One counter-list line of a specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLine {
    /// 1-based line number in the source
    pub number: usize,
    pub tokens: Vec<String>,
}

/// Parsed specification source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecDocument {
    pub lines: Vec<SpecLine>,
    pub directives: Directives,
}

impl SpecDocument {
    /// Parse a whole specification. Empty counter lists are skipped; any
    /// other parse error rejects the document.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut doc = SpecDocument::default();

        for (idx, raw) in text.lines().enumerate() {
            let number = idx + 1;
            match parse_counter_line(raw, number) {
                Ok(Some(tokens)) => doc.lines.push(SpecLine { number, tokens }),
                Ok(None) => {
                    if let Some((kind, value)) = Directives::parse_line(strip_comment(raw)) {
                        doc.directives.set_if_empty(kind, &value);
                    }
                }
                Err(ParseError::EmptyCounterList { line }) => {
                    debug!("line {}: empty counter list, nothing to collect", line);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(doc)
    }
}
