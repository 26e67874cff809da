//! Multi-pass result recombination
//!
//! Joins the per-pass counter tables of one workload back into a single
//! table with one row per kernel dispatch.

pub mod columns;
pub mod config;
pub mod csv;
pub mod export;
pub mod join;
pub mod key;
pub mod table;

pub use config::JoinConfig;
pub use join::{join_tables, DataQualityWarning, JoinReport, Joined};
pub use key::{JoinKey, JoinStrategy};
pub use table::{Table, Value};

use thiserror::Error;
use table::TableError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("no pass tables to join")]
    NoInputs,

    #[error("no join strategy named (expected kernel or grid)")]
    StrategyRequired,

    #[error("pass {pass} table has no `{column}` column")]
    MissingColumn { pass: usize, column: String },

    #[error("kernel name mismatch for {key} in pass {pass}: expected `{expected}`, found `{found}`")]
    Integrity {
        key: String,
        pass: usize,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
