//! Schedule command implementation

use anyhow::Result;
use clap::Args;
use perfmux_scheduler::{workspace, ScheduleConfig};
use std::path::PathBuf;

use crate::config::PerfmuxConfig;
use crate::output;

#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Workload directory; the schedule is written to <workload>/perfmon
    #[arg(short, long)]
    pub workload: PathBuf,

    /// Directory holding the pmc_*_perf*.txt counter definitions
    #[arg(short, long)]
    pub definitions: PathBuf,

    /// Architecture profile (overrides schedule.arch)
    #[arg(short, long)]
    pub arch: Option<String>,

    /// Only use definitions for these IP blocks (comma separated)
    #[arg(short = 'b', long = "ip-block", value_delimiter = ',')]
    pub ip_blocks: Vec<String>,

    /// Use only the roofline counter set
    #[arg(long)]
    pub roofline: bool,

    /// Write one specification file per pass
    #[arg(long)]
    pub isolate_lines: bool,

    /// Device filter directive
    #[arg(long)]
    pub gpu: Option<String>,

    /// Dispatch range directive
    #[arg(long)]
    pub range: Option<String>,

    /// Kernel name filter directive
    #[arg(long)]
    pub kernel: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl ScheduleArgs {
    /// Apply command-line overrides on top of the configured values
    pub fn apply(&self, config: &mut ScheduleConfig) {
        if let Some(arch) = &self.arch {
            config.arch = arch.clone();
        }
        if !self.ip_blocks.is_empty() {
            config.ip_blocks = Some(self.ip_blocks.clone());
        }
        config.roofline |= self.roofline;
        config.isolate_lines |= self.isolate_lines;

        if self.gpu.is_some() {
            config.directives.gpu = self.gpu.clone();
        }
        if self.range.is_some() {
            config.directives.range = self.range.clone();
        }
        if self.kernel.is_some() {
            config.directives.kernel = self.kernel.clone();
        }
    }
}

pub fn run(args: ScheduleArgs, config: &PerfmuxConfig) -> Result<()> {
    let mut schedule = config.schedule.clone();
    args.apply(&mut schedule);

    let registry = config.registry()?;
    let profile = registry.get(&schedule.arch)?;

    let summary = workspace::run(&args.workload, &args.definitions, &schedule, profile)?;

    if args.json {
        return output::json(&summary);
    }

    output::success(&format!(
        "Scheduled {} counters into {} passes for {}",
        summary.counters, summary.passes, profile.name
    ));
    for level in &summary.levels {
        let origin = level.line.as_deref().unwrap_or("-");
        output::info(&format!("Level counter {} isolated from `{}`", level.name, origin));
    }
    for path in &summary.written {
        output::info(&format!("Wrote {}", path.display()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = ScheduleConfig {
            isolate_lines: true,
            ..Default::default()
        };
        config.directives.kernel = Some("gemm".to_string());

        let args = ScheduleArgs {
            arch: Some("mi100".to_string()),
            ip_blocks: vec!["sq".to_string(), "tcc".to_string()],
            gpu: Some("0".to_string()),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.arch, "mi100");
        assert_eq!(config.ip_blocks, Some(vec!["sq".to_string(), "tcc".to_string()]));
        assert!(config.isolate_lines);
        assert_eq!(config.directives.gpu.as_deref(), Some("0"));
        assert_eq!(config.directives.kernel.as_deref(), Some("gemm"));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = ScheduleConfig::default();
        ScheduleArgs::default().apply(&mut config);
        assert_eq!(config, ScheduleConfig::default());
    }
}
