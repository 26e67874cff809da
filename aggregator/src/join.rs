//! Multi-pass table recombination
//!
//! Each pass output holds the same dispatches with a different counter
//! subset. Rows are matched on [`JoinKey`] with an inner hash join, launch
//! metadata is cross-checked, per-pass bookkeeping columns are dropped and
//! the begin/end timestamps are averaged.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

use crate::columns::{ColumnRole, InvariantFamily, BEGIN_COLUMN, END_COLUMN};
use crate::key::{compute_keys, JoinKey, JoinStrategy};
use crate::table::{Table, Value};
use crate::JoinError;

/// Launch metadata that disagreed between passes for at least one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityWarning {
    pub family: InvariantFamily,
    /// Joined rows with at least one differing copy
    pub rows: usize,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "differing {} values across passes in {} row(s)",
            self.family, self.rows
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub strategy: JoinStrategy,
    pub passes: usize,
    /// Rows in the unified table
    pub rows: usize,
    /// Per pass, rows with no partner in every other pass
    pub dropped: Vec<usize>,
    pub warnings: Vec<DataQualityWarning>,
}

impl JoinReport {
    pub fn total_dropped(&self) -> usize {
        self.dropped.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joined {
    pub table: Table,
    pub report: JoinReport,
}

/// (pass, column) position of one copy of a column
type Slot = (usize, usize);

#[derive(Debug, Default)]
struct ColumnPlan {
    /// Emitted columns with the copy they are taken from
    output: Vec<(String, Slot)>,
    kernel: Vec<Slot>,
    families: BTreeMap<InvariantFamily, Vec<Slot>>,
    begin: Vec<Slot>,
    end: Vec<Slot>,
}

impl ColumnPlan {
    fn new(tables: &[Table]) -> Self {
        let mut plan = ColumnPlan::default();
        let mut emitted = HashSet::new();

        for (pass, table) in tables.iter().enumerate() {
            for (col, name) in table.columns().iter().enumerate() {
                let copy = (pass, col);
                let role = ColumnRole::of(name);
                match role {
                    ColumnRole::Discarded => continue,
                    ColumnRole::Begin => {
                        plan.begin.push(copy);
                        continue;
                    }
                    ColumnRole::End => {
                        plan.end.push(copy);
                        continue;
                    }
                    ColumnRole::KernelName => plan.kernel.push(copy),
                    ColumnRole::Invariant(family) => {
                        plan.families.entry(family).or_default().push(copy)
                    }
                    ColumnRole::Measured => {}
                }

                if emitted.insert(name.as_str()) {
                    plan.output.push((name.clone(), copy));
                } else if role == ColumnRole::Measured {
                    debug!("Column {} repeated in pass {}, keeping the first copy", name, pass);
                }
            }
        }

        plan
    }

    fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.output.iter().map(|(name, _)| name.clone()).collect();
        if !self.begin.is_empty() {
            columns.push(BEGIN_COLUMN.to_string());
        }
        if !self.end.is_empty() {
            columns.push(END_COLUMN.to_string());
        }
        columns
    }
}

/// Row lookup for one pass; the first row wins for a repeated key
pub(crate) fn index_rows(keys: &[JoinKey]) -> HashMap<&JoinKey, usize> {
    let mut index = HashMap::with_capacity(keys.len());
    for (row, key) in keys.iter().enumerate() {
        index.entry(key).or_insert(row);
    }
    index
}

fn cell_at<'t>(tables: &'t [Table], sources: &[usize], (pass, col): Slot) -> &'t Value {
    &tables[pass].rows()[sources[pass]][col]
}

/// Mean of the numeric cells, exact when every cell is an integer and the
/// division has no remainder
fn mean<'a>(cells: impl Iterator<Item = &'a Value>) -> Value {
    let cells: Vec<&Value> = cells.filter(|v| v.as_f64().is_some()).collect();
    if cells.is_empty() {
        return Value::Empty;
    }
    let n = cells.len();

    let ints: Option<Vec<i128>> = cells.iter().map(|v| v.as_i128()).collect();
    if let Some(ints) = ints {
        let sum: i128 = ints.iter().sum();
        if sum % n as i128 == 0 {
            return Value::from_i128(sum / n as i128);
        }
        return Value::Float(sum as f64 / n as f64);
    }

    let sum: f64 = cells.iter().filter_map(|v| v.as_f64()).sum();
    Value::Float(sum / n as f64)
}

/// Join pass tables in pass order into one table
pub fn join_tables(tables: &[Table], strategy: JoinStrategy) -> Result<Joined, JoinError> {
    if tables.is_empty() {
        return Err(JoinError::NoInputs);
    }

    let keys = tables
        .iter()
        .enumerate()
        .map(|(pass, table)| compute_keys(table, strategy, pass))
        .collect::<Result<Vec<_>, _>>()?;
    let indexes: Vec<_> = keys[1..].iter().map(|k| index_rows(k)).collect();

    // Row of every pass feeding each unified row
    let mut matched: Vec<Vec<usize>> = Vec::with_capacity(tables[0].len());
    'rows: for (row, key) in keys[0].iter().enumerate() {
        let mut sources = Vec::with_capacity(tables.len());
        sources.push(row);
        for index in &indexes {
            match index.get(key) {
                Some(&other) => sources.push(other),
                None => continue 'rows,
            }
        }
        matched.push(sources);
    }

    let dropped: Vec<usize> = tables
        .iter()
        .map(|t| t.len().saturating_sub(matched.len()))
        .collect();
    for (pass, &count) in dropped.iter().enumerate() {
        if count > 0 {
            warn!(
                "Dropped {} of {} rows from pass {} with no match in every other pass",
                count,
                tables[pass].len(),
                pass
            );
        }
    }

    let plan = ColumnPlan::new(tables);

    if let Some((&first, copies)) = plan.kernel.split_first() {
        for sources in &matched {
            let expected = cell_at(tables, sources, first);
            for &copy in copies {
                let found = cell_at(tables, sources, copy);
                if found != expected {
                    return Err(JoinError::Integrity {
                        key: keys[0][sources[0]].to_string(),
                        pass: copy.0,
                        expected: expected.to_string(),
                        found: found.to_string(),
                    });
                }
            }
        }
    }

    let mut warnings = Vec::new();
    for (&family, copies) in &plan.families {
        if copies.len() < 2 {
            continue;
        }
        let differing = matched
            .iter()
            .filter(|sources| {
                let first = cell_at(tables, sources, copies[0]);
                copies[1..]
                    .iter()
                    .any(|&copy| !cell_at(tables, sources, copy).same_as(first))
            })
            .count();

        if differing > 0 {
            warn!(
                "Detected differing {} values across passes in {} rows, keeping pass {}",
                family, differing, copies[0].0
            );
            warnings.push(DataQualityWarning {
                family,
                rows: differing,
            });
        } else {
            debug!("{} consistent across {} passes", family, copies.len());
        }
    }

    let mut table = Table::new(plan.columns())?;
    for sources in &matched {
        let mut row: Vec<Value> = plan
            .output
            .iter()
            .map(|(_, copy)| cell_at(tables, sources, *copy).clone())
            .collect();
        if !plan.begin.is_empty() {
            row.push(mean(plan.begin.iter().map(|&copy| cell_at(tables, sources, copy))));
        }
        if !plan.end.is_empty() {
            row.push(mean(plan.end.iter().map(|&copy| cell_at(tables, sources, copy))));
        }
        table.push_row(row)?;
    }

    info!(
        "Joined {} passes into {} rows ({} strategy)",
        tables.len(),
        table.len(),
        strategy
    );

    Ok(Joined {
        report: JoinReport {
            strategy,
            passes: tables.len(),
            rows: table.len(),
            dropped,
            warnings,
        },
        table,
    })
}
