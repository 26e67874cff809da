//! Split command implementation

use anyhow::Result;
use clap::Args;
use perfmux_scheduler::workspace;
use std::path::PathBuf;

use crate::output;

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Workload directory holding perfmon/pmc_perf.txt
    #[arg(short, long)]
    pub workload: PathBuf,
}

pub fn run(args: SplitArgs) -> Result<()> {
    let written = workspace::split_scheduled_spec(&args.workload)?;

    output::success(&format!("Split into {} specifications", written.len()));
    for path in &written {
        output::info(&format!("Wrote {}", path.display()));
    }

    Ok(())
}
