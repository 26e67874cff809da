//! Error types shared by the scheduler and its callers

use thiserror::Error;

use crate::types::arch::Block;

/// Invalid or inconsistent architecture configuration.
///
/// Always fatal: scheduling aborts before any output is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown architecture `{0}`")]
    UnknownArchitecture(String),

    #[error("counter `{counter}` belongs to unknown block `{block}`")]
    UnknownBlock { counter: String, block: String },

    #[error("architecture `{arch}` has no capacity entry for block {block}")]
    MissingCapacity { arch: String, block: Block },

    #[error("architecture `{arch}` declares zero capacity for block {block}")]
    ZeroCapacity { arch: String, block: Block },

    #[error("architecture `{arch}` declares no TCC channels")]
    NoChannels { arch: String },

    #[error("counter `{counter}` addresses channel {channel} but `{arch}` only has {channels}")]
    ChannelOutOfRange {
        counter: String,
        channel: u32,
        arch: String,
        channels: u32,
    },
}

/// Malformed counter specification line.
///
/// Fatal for the source the line came from, except `EmptyCounterList`
/// which callers treat as a line contributing no counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: counter list is empty")]
    EmptyCounterList { line: usize },

    #[error("line {line}: malformed channel suffix in `{token}`")]
    MalformedChannel { line: usize, token: String },

    #[error("line {line}: SQ_ACCUM_PREV_HIRES has no preceding level counter")]
    DanglingAccumulator { line: usize },
}
