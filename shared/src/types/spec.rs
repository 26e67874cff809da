//! Counter specification file format
//!
//! A specification is line oriented. `#` starts a comment. Lines starting
//! with `pmc:` list counters to collect in one pass; `gpu:`, `range:` and
//! `kernel:` lines carry filters for the execution harness and are passed
//! through without interpretation.

use serde::{Deserialize, Serialize};

/// Marker introducing a counter-list line
pub const COUNTER_MARKER: &str = "pmc:";

/// Start of a line comment
pub const COMMENT_DELIMITER: char = '#';

/// Strip the comment and surrounding whitespace from a raw line
pub fn strip_comment(line: &str) -> &str {
    match line.split_once(COMMENT_DELIMITER) {
        Some((text, _)) => text.trim(),
        None => line.trim(),
    }
}

/// Auxiliary directive keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Gpu,
    Range,
    Kernel,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 3] =
        [DirectiveKind::Gpu, DirectiveKind::Range, DirectiveKind::Kernel];

    /// Line prefix, including the colon
    pub fn prefix(&self) -> &'static str {
        match self {
            DirectiveKind::Gpu => "gpu:",
            DirectiveKind::Range => "range:",
            DirectiveKind::Kernel => "kernel:",
        }
    }
}

/// Directive values written after the counter lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    /// Device filter
    pub gpu: Option<String>,

    /// Dispatch range filter
    pub range: Option<String>,

    /// Kernel name filter
    pub kernel: Option<String>,
}

impl Directives {
    /// Recognise a comment-stripped directive line
    pub fn parse_line(text: &str) -> Option<(DirectiveKind, String)> {
        DirectiveKind::ALL.iter().find_map(|kind| {
            text.strip_prefix(kind.prefix())
                .map(|value| (*kind, value.trim().to_string()))
        })
    }

    pub fn get(&self, kind: DirectiveKind) -> Option<&str> {
        match kind {
            DirectiveKind::Gpu => self.gpu.as_deref(),
            DirectiveKind::Range => self.range.as_deref(),
            DirectiveKind::Kernel => self.kernel.as_deref(),
        }
    }

    fn slot(&mut self, kind: DirectiveKind) -> &mut Option<String> {
        match kind {
            DirectiveKind::Gpu => &mut self.gpu,
            DirectiveKind::Range => &mut self.range,
            DirectiveKind::Kernel => &mut self.kernel,
        }
    }

    /// Record `value` unless a non-empty value is already present
    pub fn set_if_empty(&mut self, kind: DirectiveKind, value: &str) {
        let slot = self.slot(kind);
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    /// Fill unset values from `other`
    pub fn merge(&mut self, other: &Directives) {
        for kind in DirectiveKind::ALL {
            if let Some(value) = other.get(kind) {
                self.set_if_empty(kind, value);
            }
        }
    }

    /// Replace values with the ones set in `overrides`
    pub fn override_with(&mut self, overrides: &Directives) {
        for kind in DirectiveKind::ALL {
            if let Some(value) = overrides.get(kind) {
                *self.slot(kind) = Some(value.to_string());
            }
        }
    }

    /// Directive block, one line per key
    pub fn render(&self) -> String {
        let mut out = String::new();
        for kind in DirectiveKind::ALL {
            out.push_str(kind.prefix());
            if let Some(value) = self.get(kind) {
                out.push(' ');
                out.push_str(value);
            }
            out.push('\n');
        }
        out
    }
}

/// Format one counter-list line
pub fn render_counter_line<S: AsRef<str>>(tokens: &[S]) -> String {
    let joined: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
    format!("{} {}", COUNTER_MARKER, joined.join(" "))
}

/// Full specification text: counter lines, a blank line, then directives
pub fn render_spec<S: AsRef<str>>(lines: &[S], directives: &Directives) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&directives.render());
    out
}
