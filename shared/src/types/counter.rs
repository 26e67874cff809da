//! Performance counter records

use serde::{Deserialize, Serialize};
use std::fmt;

use super::arch::Block;

/// High-resolution accumulator that turns the counter before it into a
/// level counter
pub const ACCUMULATOR_COUNTER: &str = "SQ_ACCUM_PREV_HIRES";

/// A requested hardware counter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counter {
    /// Full counter token, including any `[channel]` suffix
    pub name: String,

    /// Owning hardware block
    pub block: Block,

    /// TCC channel the counter is addressed to (None = aggregated)
    pub channel: Option<u32>,
}

impl Counter {
    pub fn new(name: impl Into<String>, block: Block, channel: Option<u32>) -> Self {
        Self {
            name: name.into(),
            block,
            channel,
        }
    }

    /// Counter name without the channel suffix
    pub fn base_name(&self) -> &str {
        match (self.channel, self.name.find('[')) {
            (Some(_), Some(idx)) => &self.name[..idx],
            _ => &self.name,
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A counter that must be sampled alone together with its accumulator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelCounter {
    /// Level counter name; also names the output specification file
    pub name: String,

    /// Accumulator sibling
    pub accumulator: String,

    /// Counter line the pair was found on, when parsed from a source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

impl LevelCounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accumulator: ACCUMULATOR_COUNTER.to_string(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Tokens of the isolated counter line
    pub fn tokens(&self) -> Vec<String> {
        vec![self.name.clone(), self.accumulator.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_channel() {
        let c = Counter::new("TCC_HIT[3]", Block::Tcc, Some(3));
        assert_eq!(c.base_name(), "TCC_HIT");

        let agg = Counter::new("TCC_HIT_sum", Block::Tcc, None);
        assert_eq!(agg.base_name(), "TCC_HIT_sum");
    }

    #[test]
    fn test_channel_is_part_of_identity() {
        let a = Counter::new("TCC_HIT[0]", Block::Tcc, Some(0));
        let b = Counter::new("TCC_HIT[1]", Block::Tcc, Some(1));
        assert_ne!(a, b);
        assert_eq!(a.base_name(), b.base_name());
    }

    #[test]
    fn test_level_counter_tokens() {
        let level = LevelCounter::new("SQ_LEVEL_WAVES");
        assert_eq!(level.tokens(), vec!["SQ_LEVEL_WAVES", ACCUMULATOR_COUNTER]);
    }
}
