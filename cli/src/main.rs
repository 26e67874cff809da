//! CLI for perfmux
//!
//! Commands:
//! - schedule: Coalesce counter definitions into collection passes
//! - split: Split a scheduled specification into one file per pass
//! - join: Recombine per-pass result tables
//! - archs: List architecture profiles

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod output;

use config::PerfmuxConfig;

#[derive(Parser)]
#[command(name = "perfmux")]
#[command(about = "perfmux - GPU performance counter pass scheduler", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML), skipped when absent
    #[arg(short, long, global = true, default_value = "perfmux.toml")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule counter definitions into collection passes
    Schedule(commands::schedule::ScheduleArgs),

    /// Split a workload's scheduled specification into one file per pass
    Split(commands::split::SplitArgs),

    /// Join per-pass result tables into one table
    Join(commands::join::JoinArgs),

    /// List known architecture profiles
    Archs(commands::archs::ArchsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = PerfmuxConfig::load(&cli.config)?;

    match cli.command {
        Commands::Schedule(args) => commands::schedule::run(args, &config),
        Commands::Split(args) => commands::split::run(args),
        Commands::Join(args) => commands::join::run(args, &config),
        Commands::Archs(args) => commands::archs::run(args, &config),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
