//! Scheduling configuration

use perfmux_shared::types::spec::Directives;
use serde::{Deserialize, Serialize};

use crate::source::Selection;

/// Default architecture when none is configured
pub const DEFAULT_ARCH: &str = "mi200";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Active architecture profile name
    pub arch: String,

    /// Only use definition files for these IP blocks (None = all)
    pub ip_blocks: Option<Vec<String>>,

    /// Use only the roofline counter set
    pub roofline: bool,

    /// Split the schedule into one specification file per pass
    pub isolate_lines: bool,

    /// Directive values overriding those found in the sources
    pub directives: Directives,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            arch: DEFAULT_ARCH.to_string(),
            ip_blocks: None,
            roofline: false,
            isolate_lines: false,
            directives: Directives::default(),
        }
    }
}

impl ScheduleConfig {
    /// Which definition files feed the run
    pub fn selection(&self) -> Selection {
        if self.roofline {
            Selection::Roofline
        } else {
            Selection::All {
                ip_blocks: self.ip_blocks.clone(),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.arch.trim().is_empty() {
            anyhow::bail!("schedule.arch must not be empty");
        }

        if self.roofline && self.ip_blocks.is_some() {
            anyhow::bail!("IP block filtering cannot be combined with the roofline counter set");
        }

        if let Some(blocks) = &self.ip_blocks {
            if blocks.is_empty() {
                anyhow::bail!("schedule.ip_blocks must name at least one block");
            }
        }

        Ok(())
    }
}
