//! Column roles in pass output tables

use serde::Serialize;
use std::fmt;

pub const KERNEL_NAME_COLUMN: &str = "KernelName";
pub const GRID_COLUMN: &str = "grd";
pub const BEGIN_COLUMN: &str = "BeginNs";
pub const END_COLUMN: &str = "EndNs";

/// Launch metadata that must not change between passes of the same dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantFamily {
    GpuId,
    Grid,
    Workgroup,
    Lds,
    Scratch,
    ArchVgpr,
    AccumVgpr,
    Vgpr,
    Sgpr,
}

impl InvariantFamily {
    pub const ALL: [InvariantFamily; 9] = [
        InvariantFamily::GpuId,
        InvariantFamily::Grid,
        InvariantFamily::Workgroup,
        InvariantFamily::Lds,
        InvariantFamily::Scratch,
        InvariantFamily::ArchVgpr,
        InvariantFamily::AccumVgpr,
        InvariantFamily::Vgpr,
        InvariantFamily::Sgpr,
    ];

    /// Column carrying this family
    pub fn column(&self) -> &'static str {
        match self {
            InvariantFamily::GpuId => "gpu-id",
            InvariantFamily::Grid => GRID_COLUMN,
            InvariantFamily::Workgroup => "wgr",
            InvariantFamily::Lds => "lds",
            InvariantFamily::Scratch => "scr",
            InvariantFamily::ArchVgpr => "arch_vgpr",
            InvariantFamily::AccumVgpr => "accum_vgpr",
            InvariantFamily::Vgpr => "vgpr",
            InvariantFamily::Sgpr => "sgpr",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

impl fmt::Display for InvariantFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Columns describing how a single pass ran rather than what it measured
pub const PASS_SPECIFIC_COLUMNS: [&str; 7] =
    ["queue-id", "queue-index", "pid", "tid", "fbar", "sig", "obj"];

/// Timestamps with no meaningful cross-pass combination
pub const DISCARDED_TIMESTAMPS: [&str; 2] = ["DispatchNs", "CompleteNs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Raw kernel name, must match exactly across passes
    KernelName,
    Invariant(InvariantFamily),
    /// Dropped from the unified table
    Discarded,
    /// Averaged across passes
    Begin,
    End,
    /// Counter values and anything else; the first pass's copy is kept
    Measured,
}

impl ColumnRole {
    pub fn of(column: &str) -> Self {
        if column == KERNEL_NAME_COLUMN {
            return ColumnRole::KernelName;
        }
        if let Some(family) = InvariantFamily::from_column(column) {
            return ColumnRole::Invariant(family);
        }
        if PASS_SPECIFIC_COLUMNS.contains(&column) || DISCARDED_TIMESTAMPS.contains(&column) {
            return ColumnRole::Discarded;
        }
        match column {
            BEGIN_COLUMN => ColumnRole::Begin,
            END_COLUMN => ColumnRole::End,
            _ => ColumnRole::Measured,
        }
    }
}
