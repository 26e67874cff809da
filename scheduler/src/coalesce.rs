//! Counter coalescing
//!
//! Buckets every requested counter by owning block, dropping duplicates
//! while keeping first-appearance order. TCC counters addressed to a
//! channel go to that channel's bucket; un-addressed TCC counters go to the
//! aggregated bucket. Level counters are kept apart from all buckets.

use perfmux_shared::error::{ConfigError, ParseError};
use perfmux_shared::types::arch::{ArchitectureProfile, Block};
use perfmux_shared::types::counter::{Counter, LevelCounter};
use perfmux_shared::types::spec::Directives;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::parse::{parse_token, split_levels, CounterToken, SpecDocument};
use crate::source::SpecSource;
use crate::ScheduleError;

/// Per-block counter buckets for one scheduling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    /// Architecture the buckets were sized for
    arch: String,

    /// Ordinary blocks (everything but TCC)
    blocks: BTreeMap<Block, Vec<Counter>>,

    /// Un-addressed TCC counters
    aggregated: Vec<Counter>,

    /// Channel-addressed TCC counters, indexed by channel
    channels: Vec<Vec<Counter>>,

    levels: Vec<LevelCounter>,
}

impl Buckets {
    /// Empty buckets sized for `profile`
    pub fn new(profile: &ArchitectureProfile) -> Self {
        let blocks = Block::ALL
            .iter()
            .filter(|b| !b.is_channel_addressable())
            .map(|&b| (b, Vec::new()))
            .collect();
        Self {
            arch: profile.name.clone(),
            blocks,
            aggregated: Vec::new(),
            channels: vec![Vec::new(); profile.channels as usize],
            levels: Vec::new(),
        }
    }

    /// Insert a counter unless it is already present.
    ///
    /// Returns whether the counter was new.
    pub fn insert(&mut self, counter: Counter) -> Result<bool, ConfigError> {
        let channel_count = self.channels.len() as u32;
        let bucket = match (counter.block, counter.channel) {
            (Block::Tcc, None) => &mut self.aggregated,
            (Block::Tcc, Some(ch)) => {
                self.channels
                    .get_mut(ch as usize)
                    .ok_or_else(|| ConfigError::ChannelOutOfRange {
                        counter: counter.name.clone(),
                        channel: ch,
                        arch: self.arch.clone(),
                        channels: channel_count,
                    })?
            }
            (block, _) => self.blocks.entry(block).or_default(),
        };

        if bucket.iter().any(|c| c.name == counter.name) {
            return Ok(false);
        }
        bucket.push(counter);
        Ok(true)
    }

    /// Record a level counter unless one with the same name exists
    pub fn insert_level(&mut self, level: LevelCounter) -> bool {
        if self.levels.iter().any(|l| l.name == level.name) {
            return false;
        }
        self.levels.push(level);
        true
    }

    /// Bucket of an ordinary block, or the aggregated bucket for TCC
    pub fn block(&self, block: Block) -> &[Counter] {
        if block.is_channel_addressable() {
            return &self.aggregated;
        }
        self.blocks.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn aggregated(&self) -> &[Counter] {
        &self.aggregated
    }

    pub fn channel(&self, channel: usize) -> &[Counter] {
        self.channels.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn channels(&self) -> &[Vec<Counter>] {
        &self.channels
    }

    /// Size of the largest per-channel bucket
    pub fn max_channel_len(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn levels(&self) -> &[LevelCounter] {
        &self.levels
    }

    /// Number of ordinary counters across all buckets
    pub fn len(&self) -> usize {
        self.blocks.values().map(Vec::len).sum::<usize>()
            + self.aggregated.len()
            + self.channels.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort every channel bucket by name so the same counter sits at the
    /// same offset in each channel
    fn sort_channels(&mut self) {
        for bucket in &mut self.channels {
            bucket.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

/// Result of coalescing all sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coalesced {
    pub buckets: Buckets,

    /// Directives gathered from the sources, first value per key wins
    pub directives: Directives,
}

/// Incremental coalescer over several sources
pub struct Coalescer<'a> {
    profile: &'a ArchitectureProfile,
    buckets: Buckets,
    directives: Directives,
}

impl<'a> Coalescer<'a> {
    pub fn new(profile: &'a ArchitectureProfile) -> Self {
        Self {
            profile,
            buckets: Buckets::new(profile),
            directives: Directives::default(),
        }
    }

    /// Read, parse and ingest one source
    pub fn ingest_source<S: SpecSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<(), ScheduleError> {
        let source_name = source.name();
        let text = source.read().map_err(|error| ScheduleError::Read {
            source_name: source_name.clone(),
            error,
        })?;
        let doc = SpecDocument::parse(&text).map_err(|error| ScheduleError::Parse {
            source_name: source_name.clone(),
            error,
        })?;
        self.ingest_document(&source_name, &doc)
    }

    /// Ingest an already parsed document
    pub fn ingest_document(
        &mut self,
        source_name: &str,
        doc: &SpecDocument,
    ) -> Result<(), ScheduleError> {
        let parse_err = |error: ParseError| ScheduleError::Parse {
            source_name: source_name.to_string(),
            error,
        };

        let mut added = 0usize;
        for line in &doc.lines {
            let split = split_levels(&line.tokens, line.number).map_err(parse_err)?;

            for level in split.levels {
                debug!("{}: level counter {} isolated", source_name, level.name);
                self.buckets.insert_level(level);
            }

            for token in &split.ordinary {
                let parsed = parse_token(token, line.number).map_err(parse_err)?;
                let counter = self.resolve(parsed)?;
                if self.buckets.insert(counter)? {
                    added += 1;
                }
            }
        }

        self.directives.merge(&doc.directives);
        debug!("{}: {} new counters", source_name, added);
        Ok(())
    }

    /// Turn a parsed token into a counter owned by a block of the profile
    fn resolve(&self, token: CounterToken) -> Result<Counter, ConfigError> {
        let block: Block = token.prefix.parse().map_err(|_| ConfigError::UnknownBlock {
            counter: token.name.clone(),
            block: token.prefix.clone(),
        })?;
        self.profile.capacity(block)?;

        if let Some(channel) = token.channel {
            if channel >= self.profile.channels {
                return Err(ConfigError::ChannelOutOfRange {
                    counter: token.name,
                    channel,
                    arch: self.profile.name.clone(),
                    channels: self.profile.channels,
                });
            }
        }

        Ok(Counter::new(token.name, block, token.channel))
    }

    /// Finish ingestion; channel buckets are sorted here
    pub fn finish(mut self) -> Coalesced {
        self.buckets.sort_channels();
        info!(
            "Coalesced {} counters ({} level counters) for {}",
            self.buckets.len(),
            self.buckets.levels().len(),
            self.profile.name
        );
        Coalesced {
            buckets: self.buckets,
            directives: self.directives,
        }
    }
}

/// Coalesce every source against `profile`
pub fn coalesce<S: SpecSource>(
    sources: &[S],
    profile: &ArchitectureProfile,
) -> Result<Coalesced, ScheduleError> {
    let mut coalescer = Coalescer::new(profile);
    for source in sources {
        coalescer.ingest_source(source)?;
    }
    Ok(coalescer.finish())
}
