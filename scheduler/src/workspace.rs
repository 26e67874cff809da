//! Workload directory output
//!
//! Writes the scheduled specification, the level counter specifications and,
//! when requested, the per-line split specifications.

use anyhow::{Context, Result};
use perfmux_shared::types::arch::ArchitectureProfile;
use perfmux_shared::types::counter::LevelCounter;
use perfmux_shared::utils::paths;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::coalesce::coalesce;
use crate::config::ScheduleConfig;
use crate::emit::{schedule, Schedule};
use crate::source::select_sources;
use crate::split::split_spec;

/// Outcome of a scheduling run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub passes: usize,
    pub counters: usize,

    /// Level counters written to their own specification, with the line
    /// each was found on
    pub levels: Vec<LevelCounter>,

    /// Files written, in write order
    pub written: Vec<PathBuf>,
}

/// Recreate `<workload>/perfmon` empty
pub fn prepare_perfmon_dir(workload: &Path) -> Result<PathBuf> {
    let dir = paths::perfmon_dir(workload);
    if dir.exists() {
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to clear {}", dir.display()))?;
    }
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the scheduled specification and one file per level counter
pub fn write_schedule(workload: &Path, schedule: &Schedule) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let spec_path = paths::scheduled_spec_path(workload);
    write_file(&spec_path, &schedule.render())?;
    info!("Scheduled specification written to {}", spec_path.display());
    written.push(spec_path);

    for level in &schedule.levels {
        let path = paths::level_spec_path(workload, &level.name);
        write_file(&path, &schedule.render_level(level))?;
        match &level.line {
            Some(line) => info!(
                "Level counter {} (from `{}`) written to {}",
                level.name,
                line,
                path.display()
            ),
            None => info!("Level counter {} written to {}", level.name, path.display()),
        }
        written.push(path);
    }

    Ok(written)
}

/// Replace the scheduled specification with one file per counter line
pub fn split_scheduled_spec(workload: &Path) -> Result<Vec<PathBuf>> {
    let spec_path = paths::scheduled_spec_path(workload);
    let text = fs::read_to_string(&spec_path)
        .with_context(|| format!("Failed to read {}", spec_path.display()))?;
    let parts =
        split_spec(&text).with_context(|| format!("Failed to parse {}", spec_path.display()))?;

    let mut written = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let path = paths::pass_spec_path(workload, i);
        write_file(&path, part)?;
        written.push(path);
    }

    fs::remove_file(&spec_path)
        .with_context(|| format!("Failed to remove {}", spec_path.display()))?;
    info!("Split {} into {} specifications", spec_path.display(), written.len());

    Ok(written)
}

/// Select definitions, coalesce, schedule and write everything for one
/// workload. Nothing is written unless scheduling succeeds.
pub fn run(
    workload: &Path,
    definitions: &Path,
    config: &ScheduleConfig,
    profile: &ArchitectureProfile,
) -> Result<ScheduleSummary> {
    config.validate()?;

    let sources = select_sources(definitions, &profile.name, &config.selection())?;
    if sources.is_empty() {
        anyhow::bail!("No counter definition files found in {}", definitions.display());
    }

    let mut coalesced = coalesce(&sources, profile)?;
    coalesced.directives.override_with(&config.directives);
    let schedule = schedule(&coalesced, profile)?;

    prepare_perfmon_dir(workload)?;
    let mut written = write_schedule(workload, &schedule)?;

    if config.isolate_lines {
        let spec_path = paths::scheduled_spec_path(workload);
        written.retain(|p| p != &spec_path);
        written.extend(split_scheduled_spec(workload)?);
    }

    Ok(ScheduleSummary {
        passes: schedule.passes.len(),
        counters: coalesced.buckets.len(),
        levels: schedule.levels.clone(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfmux_shared::types::spec::Directives;

    #[test]
    fn test_prepare_clears_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let perfmon = prepare_perfmon_dir(dir.path()).unwrap();
        fs::write(perfmon.join("stale.txt"), "old").unwrap();

        let perfmon = prepare_perfmon_dir(dir.path()).unwrap();
        assert!(perfmon.is_dir());
        assert!(!perfmon.join("stale.txt").exists());
    }

    #[test]
    fn test_write_schedule_with_levels() {
        let dir = tempfile::tempdir().unwrap();
        prepare_perfmon_dir(dir.path()).unwrap();

        let schedule = Schedule {
            passes: Vec::new(),
            levels: vec![LevelCounter::new("SQ_LEVEL_WAVES")],
            directives: Directives::default(),
        };
        let written = write_schedule(dir.path(), &schedule).unwrap();
        assert_eq!(written.len(), 2);

        let level =
            fs::read_to_string(paths::level_spec_path(dir.path(), "SQ_LEVEL_WAVES")).unwrap();
        assert!(level.starts_with("pmc: SQ_LEVEL_WAVES SQ_ACCUM_PREV_HIRES\n"));
    }

    #[test]
    fn test_split_removes_scheduled_spec() {
        let dir = tempfile::tempdir().unwrap();
        prepare_perfmon_dir(dir.path()).unwrap();
        let spec_path = paths::scheduled_spec_path(dir.path());
        fs::write(&spec_path, "pmc: SQ_A\npmc: SQ_B\n\ngpu:\nrange:\nkernel:\n").unwrap();

        let written = split_scheduled_spec(dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(!spec_path.exists());
        let second = fs::read_to_string(paths::pass_spec_path(dir.path(), 1)).unwrap();
        assert_eq!(second, "pmc: SQ_B\n\ngpu:\nrange:\nkernel:\n");
    }
}
