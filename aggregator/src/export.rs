//! Pass table discovery and unified table output

use anyhow::{Context, Result};
use perfmux_shared::utils::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::JoinConfig;
use crate::csv::{parse_csv, write_csv};
use crate::join::{join_tables, JoinReport};
use crate::table::Table;

/// `pmc_perf_<i>.csv` files in `workload`, ordered by pass index
pub fn discover_pass_tables(workload: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(workload)
        .with_context(|| format!("Failed to read {}", workload.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let index = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| paths::pass_index(n, "csv"));
        if let Some(index) = index {
            found.push((index, path));
        }
    }
    found.sort();

    Ok(found.into_iter().map(|(_, path)| path).collect())
}

pub fn read_table(path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table = parse_csv(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    fs::write(path, write_csv(table)).with_context(|| format!("Failed to write {}", path.display()))
}

/// Join every pass table of `workload` and write the unified table.
/// Nothing is written or removed unless the join succeeds.
pub fn run(workload: &Path, config: &JoinConfig) -> Result<(PathBuf, JoinReport)> {
    let strategy = config.strategy()?;
    let inputs = discover_pass_tables(workload)?;
    if inputs.is_empty() {
        anyhow::bail!(
            "No pass tables (pmc_perf_<i>.csv) found in {}",
            workload.display()
        );
    }

    let tables = inputs
        .iter()
        .map(|p| read_table(p))
        .collect::<Result<Vec<_>>>()?;
    let joined = join_tables(&tables, strategy)?;

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| paths::unified_table_path(workload));
    write_table(&output, &joined.table)?;
    info!("Unified table written to {}", output.display());

    if config.remove_inputs {
        for path in &inputs {
            fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        info!("Removed {} pass tables", inputs.len());
    }

    Ok((output, joined.report))
}
