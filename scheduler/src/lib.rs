//! Counter pass scheduling
//!
//! Coalesces counter requests from several specification sources into
//! per-block buckets and packs them into the minimum number of collection
//! passes the hardware can sample.

pub mod coalesce;
pub mod config;
pub mod emit;
pub mod parse;
pub mod source;
pub mod split;
pub mod workspace;

pub use coalesce::{coalesce, Buckets, Coalesced, Coalescer};
pub use config::ScheduleConfig;
pub use emit::{emit, pass_count, Pass, Schedule};
pub use source::{FileSource, InlineSource, Selection, SpecSource};
pub use split::split_spec;

use perfmux_shared::error::{ConfigError, ParseError};
use perfmux_shared::types::arch::ArchitectureProfile;
use thiserror::Error;

/// Scheduling failure
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{source_name}: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: ParseError,
    },

    #[error("failed to read {source_name}: {error}")]
    Read {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
}

/// Coalesce `sources` and schedule the result in one step
pub fn schedule_sources<S: SpecSource>(
    sources: &[S],
    profile: &ArchitectureProfile,
) -> Result<Schedule, ScheduleError> {
    let coalesced = coalesce(sources, profile)?;
    Ok(emit::schedule(&coalesced, profile)?)
}
