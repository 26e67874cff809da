//! Archs command implementation

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use perfmux_shared::types::arch::ArchitectureProfile;

use crate::config::PerfmuxConfig;
use crate::output;

#[derive(Args, Debug)]
pub struct ArchsArgs {
    /// Print profiles as JSON
    #[arg(long)]
    pub json: bool,
}

/// `SQ=8 TA=2 ...` in block order
fn capacity_line(profile: &ArchitectureProfile) -> String {
    profile
        .capacities
        .iter()
        .map(|(block, cap)| format!("{}={}", block, cap))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn run(args: ArchsArgs, config: &PerfmuxConfig) -> Result<()> {
    let registry = config.registry()?;

    if args.json {
        let profiles: Vec<_> = registry.iter().collect();
        return output::json(&profiles);
    }

    for profile in registry.iter() {
        let marker = if profile.name == config.schedule.arch { "*" } else { " " };
        println!(
            "{} {:<10} channels={:<3} {}",
            marker.green(),
            profile.name.bold(),
            profile.channels,
            capacity_line(profile)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_line_in_block_order() {
        let profile = ArchitectureProfile::builtin("mi50").unwrap();
        assert_eq!(
            capacity_line(&profile),
            "SQ=8 GRBM=2 TCP=4 TA=2 TD=2 SPI=2 CPC=2 CPF=2 GDS=4 TCC=4"
        );
    }
}
