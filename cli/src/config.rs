//! Layered configuration: optional TOML file, then `PERFMUX__` environment
//! variables (`PERFMUX__SCHEDULE__ARCH=mi100`, `PERFMUX__JOIN__STRATEGY=grid`)

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use perfmux_aggregator::JoinConfig;
use perfmux_scheduler::ScheduleConfig;
use perfmux_shared::types::arch::{ArchitectureProfile, ProfileRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "PERFMUX";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfmuxConfig {
    pub schedule: ScheduleConfig,
    pub join: JoinConfig,

    /// User-defined profiles, added to or replacing the built-ins
    pub architectures: BTreeMap<String, ArchitectureProfile>,
}

impl PerfmuxConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.schedule.validate()?;

        Ok(config)
    }

    /// Built-in profiles extended with the configured ones
    pub fn registry(&self) -> Result<ProfileRegistry> {
        let mut registry = ProfileRegistry::with_builtins();
        registry
            .extend(self.architectures.clone())
            .context("Invalid architecture profile")?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfmux_aggregator::JoinStrategy;
    use perfmux_shared::types::arch::Block;
    use std::fs;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PerfmuxConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.schedule.arch, "mi200");
        assert_eq!(config.join.strategy, None);
        assert!(config.architectures.is_empty());
    }

    #[test]
    fn test_file_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perfmux.toml");
        fs::write(
            &path,
            r#"
[schedule]
arch = "tiny"
isolate_lines = true

[join]
strategy = "grid"
remove_inputs = true

[architectures.tiny]
channels = 2

[architectures.tiny.capacities]
sq = 2
tcc = 1
"#,
        )
        .unwrap();

        let config = PerfmuxConfig::load(&path).unwrap();
        assert_eq!(config.schedule.arch, "tiny");
        assert!(config.schedule.isolate_lines);
        assert_eq!(config.join.strategy, Some(JoinStrategy::Grid));
        assert!(config.join.remove_inputs);

        let registry = config.registry().unwrap();
        let tiny = registry.get("tiny").unwrap();
        assert_eq!(tiny.name, "tiny");
        assert_eq!(tiny.channels, 2);
        assert_eq!(tiny.capacity(Block::Sq).unwrap(), 2);
        assert!(registry.get("mi100").is_ok());
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let config = PerfmuxConfig {
            architectures: BTreeMap::from([(
                "broken".to_string(),
                ArchitectureProfile {
                    name: String::new(),
                    capacities: BTreeMap::from([(Block::Sq, 0)]),
                    channels: 4,
                },
            )]),
            ..Default::default()
        };
        assert!(config.registry().is_err());
    }

    #[test]
    fn test_invalid_schedule_section_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perfmux.toml");
        fs::write(&path, "[schedule]\nroofline = true\nip_blocks = [\"sq\"]\n").unwrap();
        assert!(PerfmuxConfig::load(&path).is_err());
    }
}
