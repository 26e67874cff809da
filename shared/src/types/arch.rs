//! Architecture profiles
//!
//! Each supported device class has a fixed number of counters that every
//! hardware block can sample at the same time. The TCC block is additionally
//! instantiated once per memory channel and can be addressed per channel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Hardware block owning a set of performance counters.
///
/// The variant order is the order blocks are written into a pass line;
/// TCC is always last because its slice depends on the channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Block {
    Sq,
    Grbm,
    Tcp,
    Ta,
    Td,
    Spi,
    Cpc,
    Cpf,
    Gds,
    Tcc,
}

impl Block {
    /// All blocks in emission order
    pub const ALL: [Block; 10] = [
        Block::Sq,
        Block::Grbm,
        Block::Tcp,
        Block::Ta,
        Block::Td,
        Block::Spi,
        Block::Cpc,
        Block::Cpf,
        Block::Gds,
        Block::Tcc,
    ];

    /// Counter name prefix of this block
    pub fn as_str(&self) -> &'static str {
        match self {
            Block::Sq => "SQ",
            Block::Grbm => "GRBM",
            Block::Tcp => "TCP",
            Block::Ta => "TA",
            Block::Td => "TD",
            Block::Spi => "SPI",
            Block::Cpc => "CPC",
            Block::Cpf => "CPF",
            Block::Gds => "GDS",
            Block::Tcc => "TCC",
        }
    }

    /// Whether counters of this block may carry a `[channel]` suffix
    pub fn is_channel_addressable(&self) -> bool {
        matches!(self, Block::Tcc)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Block {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Block::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == upper)
            .ok_or_else(|| format!("unknown block: {}", s))
    }
}

impl TryFrom<String> for Block {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Block> for String {
    fn from(block: Block) -> Self {
        block.as_str().to_string()
    }
}

/// Counter capacities of one device class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureProfile {
    /// Device class identifier (e.g. "mi200")
    #[serde(default)]
    pub name: String,

    /// Simultaneous counters per block
    pub capacities: BTreeMap<Block, u32>,

    /// Number of TCC channels
    pub channels: u32,
}

impl ArchitectureProfile {
    /// Profile with the capacities shared by all built-in device classes
    fn gfx9(name: &str, channels: u32) -> Self {
        let capacities = BTreeMap::from([
            (Block::Sq, 8),
            (Block::Ta, 2),
            (Block::Td, 2),
            (Block::Tcp, 4),
            (Block::Tcc, 4),
            (Block::Cpc, 2),
            (Block::Cpf, 2),
            (Block::Spi, 2),
            (Block::Grbm, 2),
            (Block::Gds, 4),
        ]);
        Self {
            name: name.to_string(),
            capacities,
            channels,
        }
    }

    /// All built-in profiles
    pub fn builtins() -> Vec<Self> {
        vec![
            Self::gfx9("vega10", 16),
            Self::gfx9("mi50", 16),
            Self::gfx9("mi100", 32),
            Self::gfx9("mi200", 32),
        ]
    }

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        Self::builtins()
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownArchitecture(name.to_string()))
    }

    /// Simultaneous counter capacity of `block`
    pub fn capacity(&self, block: Block) -> Result<usize, ConfigError> {
        match self.capacities.get(&block) {
            None => Err(ConfigError::MissingCapacity {
                arch: self.name.clone(),
                block,
            }),
            Some(0) => Err(ConfigError::ZeroCapacity {
                arch: self.name.clone(),
                block,
            }),
            Some(&n) => Ok(n as usize),
        }
    }

    /// Validate that every declared capacity is at least one and that the
    /// profile has TCC channels
    pub fn validate(&self) -> Result<(), ConfigError> {
        for &block in self.capacities.keys() {
            self.capacity(block)?;
        }
        if self.channels == 0 {
            return Err(ConfigError::NoChannels {
                arch: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Set of known architecture profiles, keyed by name
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ArchitectureProfile>,
}

impl ProfileRegistry {
    /// Registry holding only the built-in profiles
    pub fn with_builtins() -> Self {
        let profiles = ArchitectureProfile::builtins()
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        Self { profiles }
    }

    /// Add or replace profiles. Each profile is validated and takes the
    /// name it is registered under.
    pub fn extend(
        &mut self,
        custom: impl IntoIterator<Item = (String, ArchitectureProfile)>,
    ) -> Result<(), ConfigError> {
        for (name, mut profile) in custom {
            profile.name = name.clone();
            profile.validate()?;
            self.profiles.insert(name, profile);
        }
        Ok(())
    }

    /// Get the profile for `name`
    pub fn get(&self, name: &str) -> Result<&ArchitectureProfile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownArchitecture(name.to_string()))
    }

    /// Iterate profiles in name order
    pub fn iter(&self) -> impl Iterator<Item = &ArchitectureProfile> {
        self.profiles.values()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
