//! Join command implementation

use anyhow::Result;
use clap::Args;
use perfmux_aggregator::{export, JoinConfig, JoinStrategy};
use std::path::PathBuf;

use crate::config::PerfmuxConfig;
use crate::output;

#[derive(Args, Debug, Default)]
pub struct JoinArgs {
    /// Workload directory holding pmc_perf_<i>.csv
    #[arg(short, long)]
    pub workload: PathBuf,

    /// Row matching strategy: kernel or grid (required unless join.strategy
    /// is configured)
    #[arg(short, long)]
    pub strategy: Option<JoinStrategy>,

    /// Unified table path (default <workload>/pmc_perf.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Remove the per-pass tables after a successful join
    #[arg(long)]
    pub remove_inputs: bool,

    /// Print the join report as JSON
    #[arg(long)]
    pub json: bool,
}

impl JoinArgs {
    pub fn apply(&self, config: &mut JoinConfig) {
        if let Some(strategy) = self.strategy {
            config.strategy = Some(strategy);
        }
        if self.output.is_some() {
            config.output = self.output.clone();
        }
        config.remove_inputs |= self.remove_inputs;
    }
}

pub fn run(args: JoinArgs, config: &PerfmuxConfig) -> Result<()> {
    let mut join = config.join.clone();
    args.apply(&mut join);

    let (path, report) = export::run(&args.workload, &join)?;

    if args.json {
        return output::json(&report);
    }

    for (pass, &dropped) in report.dropped.iter().enumerate() {
        if dropped > 0 {
            output::warning(&format!("Pass {}: {} unmatched rows dropped", pass, dropped));
        }
    }
    for warning in &report.warnings {
        output::warning(&warning.to_string());
    }
    output::success(&format!(
        "Joined {} passes into {} rows ({} strategy): {}",
        report.passes,
        report.rows,
        report.strategy,
        path.display()
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = JoinConfig {
            remove_inputs: true,
            ..Default::default()
        };
        let args = JoinArgs {
            strategy: Some(JoinStrategy::Grid),
            output: Some(PathBuf::from("out.csv")),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.strategy, Some(JoinStrategy::Grid));
        assert_eq!(config.output, Some(PathBuf::from("out.csv")));
        assert!(config.remove_inputs);
    }

    #[test]
    fn test_configured_strategy_kept_without_flag() {
        let mut config = JoinConfig::new(JoinStrategy::Grid);
        JoinArgs::default().apply(&mut config);
        assert_eq!(config.strategy, Some(JoinStrategy::Grid));

        let mut unset = JoinConfig::default();
        JoinArgs::default().apply(&mut unset);
        assert!(unset.strategy().is_err());
    }
}
