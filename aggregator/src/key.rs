//! Kernel invocation identity
//!
//! Every pass dispatches the same kernels in the same order, so the n-th
//! dispatch of a kernel in one pass corresponds to the n-th dispatch of
//! that kernel in every other pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::columns::{GRID_COLUMN, KERNEL_NAME_COLUMN};
use crate::table::Table;
use crate::JoinError;

/// How dispatches are matched across passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Kernel name and occurrence
    Kernel,
    /// Kernel name, grid size and occurrence
    Grid,
}

impl JoinStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStrategy::Kernel => "kernel",
            JoinStrategy::Grid => "grid",
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kernel" => Ok(JoinStrategy::Kernel),
            "grid" => Ok(JoinStrategy::Grid),
            other => Err(format!("unknown join strategy `{}` (expected kernel or grid)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinKey {
    /// Kernel name with surrounding whitespace removed
    pub kernel: String,
    pub grid: Option<String>,
    /// Zero-based count of earlier rows with the same kernel (and grid)
    pub occurrence: usize,
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.grid {
            Some(grid) => write!(f, "{} - {} - {}", self.kernel, grid, self.occurrence),
            None => write!(f, "{} - {}", self.kernel, self.occurrence),
        }
    }
}

/// One key per row of `table`, in row order
pub fn compute_keys(
    table: &Table,
    strategy: JoinStrategy,
    pass: usize,
) -> Result<Vec<JoinKey>, JoinError> {
    let missing = |column: &str| JoinError::MissingColumn {
        pass,
        column: column.to_string(),
    };

    let kernels = table
        .column(KERNEL_NAME_COLUMN)
        .ok_or_else(|| missing(KERNEL_NAME_COLUMN))?;
    let grids = match strategy {
        JoinStrategy::Kernel => None,
        JoinStrategy::Grid => Some(table.column(GRID_COLUMN).ok_or_else(|| missing(GRID_COLUMN))?),
    };

    let mut seen: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut keys = Vec::with_capacity(kernels.len());

    for (row, kernel) in kernels.iter().enumerate() {
        let kernel = kernel.to_string().trim().to_string();
        let grid = grids.as_ref().map(|g| g[row].to_string());

        let count = seen.entry((kernel.clone(), grid.clone())).or_insert(0);
        keys.push(JoinKey {
            kernel,
            grid,
            occurrence: *count,
        });
        *count += 1;
    }

    Ok(keys)
}
