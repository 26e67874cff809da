//! Pass scheduling
//!
//! Packs coalesced buckets into the minimum number of collection passes.
//! Every ordinary block contributes the slice at offset `pass * capacity`.
//! TCC first drains its aggregated bucket the same way; once that is
//! exhausted, every channel contributes the slice at offset
//! `channel_pass * capacity`, where `channel_pass` counts the passes that
//! had no aggregated TCC counters.

use perfmux_shared::error::ConfigError;
use perfmux_shared::types::arch::{ArchitectureProfile, Block};
use perfmux_shared::types::counter::{Counter, LevelCounter};
use perfmux_shared::types::spec::{render_counter_line, render_spec, Directives};
use perfmux_shared::utils::{ceil_div, window};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::coalesce::{Buckets, Coalesced};

/// Counters requested in one collection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub index: usize,

    /// Non-empty slices of the ordinary blocks; TCC holds the aggregated
    /// slice when this pass still draws from it
    pub blocks: BTreeMap<Block, Vec<Counter>>,

    /// Per-channel TCC slices, indexed by channel. Empty unless this pass
    /// samples channel-addressed counters.
    pub channels: Vec<Vec<Counter>>,
}

impl Pass {
    /// Slice assigned to `block` (aggregated slice for TCC)
    pub fn slice(&self, block: Block) -> &[Counter] {
        self.blocks.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Slice assigned to one TCC channel
    pub fn channel_slice(&self, channel: usize) -> &[Counter] {
        self.channels.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All counters in line order
    pub fn counters(&self) -> impl Iterator<Item = &Counter> {
        self.blocks
            .values()
            .flatten()
            .chain(self.channels.iter().flatten())
    }

    pub fn len(&self) -> usize {
        self.counters().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `pmc:` line requesting this pass's counters
    pub fn line(&self) -> String {
        let tokens: Vec<&str> = self.counters().map(|c| c.name.as_str()).collect();
        render_counter_line(&tokens)
    }
}

/// Emitted schedule: the passes plus everything written alongside them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub passes: Vec<Pass>,

    /// Level counters, each collected in its own run
    pub levels: Vec<LevelCounter>,

    pub directives: Directives,
}

impl Schedule {
    /// One counter line per pass
    pub fn lines(&self) -> Vec<String> {
        self.passes.iter().map(Pass::line).collect()
    }

    /// Scheduled specification text handed to the execution harness
    pub fn render(&self) -> String {
        render_spec(&self.lines(), &self.directives)
    }

    /// Isolated specification text for one level counter
    pub fn render_level(&self, level: &LevelCounter) -> String {
        render_spec(&[render_counter_line(&level.tokens())], &self.directives)
    }
}

/// Capacities of every block that has counters
fn capacities(
    buckets: &Buckets,
    profile: &ArchitectureProfile,
) -> Result<BTreeMap<Block, usize>, ConfigError> {
    let mut caps = BTreeMap::new();
    for block in Block::ALL {
        let used = if block.is_channel_addressable() {
            !buckets.aggregated().is_empty() || buckets.max_channel_len() > 0
        } else {
            !buckets.block(block).is_empty()
        };
        if used {
            caps.insert(block, profile.capacity(block)?);
        }
    }
    Ok(caps)
}

/// Minimum number of passes needed to sample every bucket
pub fn pass_count(buckets: &Buckets, profile: &ArchitectureProfile) -> Result<usize, ConfigError> {
    let caps = capacities(buckets, profile)?;
    Ok(count_with(buckets, &caps))
}

fn count_with(buckets: &Buckets, caps: &BTreeMap<Block, usize>) -> usize {
    caps.iter()
        .map(|(&block, &cap)| {
            if block.is_channel_addressable() {
                ceil_div(buckets.aggregated().len(), cap) + ceil_div(buckets.max_channel_len(), cap)
            } else {
                ceil_div(buckets.block(block).len(), cap)
            }
        })
        .max()
        .unwrap_or(0)
}

/// Assign every bucketed counter to exactly one pass
pub fn emit(buckets: &Buckets, profile: &ArchitectureProfile) -> Result<Vec<Pass>, ConfigError> {
    let caps = capacities(buckets, profile)?;
    let count = count_with(buckets, &caps);

    let mut passes = Vec::with_capacity(count);
    let mut channel_pass = 0;

    for index in 0..count {
        let mut blocks = BTreeMap::new();
        let mut channels = Vec::new();

        for (&block, &cap) in &caps {
            if block.is_channel_addressable() {
                let aggregated = window(buckets.aggregated(), index * cap, cap);
                if !aggregated.is_empty() {
                    blocks.insert(block, aggregated.to_vec());
                    continue;
                }

                let per_channel: Vec<Vec<Counter>> = buckets
                    .channels()
                    .iter()
                    .map(|bucket| window(bucket, channel_pass * cap, cap).to_vec())
                    .collect();
                if per_channel.iter().any(|slice| !slice.is_empty()) {
                    channels = per_channel;
                }
                channel_pass += 1;
            } else {
                let slice = window(buckets.block(block), index * cap, cap);
                if !slice.is_empty() {
                    blocks.insert(block, slice.to_vec());
                }
            }
        }

        let pass = Pass {
            index,
            blocks,
            channels,
        };
        debug!("pass {}: {} counters", index, pass.len());
        passes.push(pass);
    }

    Ok(passes)
}

/// Build the full schedule from coalesced buckets
pub fn schedule(
    coalesced: &Coalesced,
    profile: &ArchitectureProfile,
) -> Result<Schedule, ConfigError> {
    let passes = emit(&coalesced.buckets, profile)?;
    info!(
        "Scheduled {} counters into {} passes on {}",
        coalesced.buckets.len(),
        passes.len(),
        profile.name
    );
    Ok(Schedule {
        passes,
        levels: coalesced.buckets.levels().to_vec(),
        directives: coalesced.directives.clone(),
    })
}
