//! Workload directory layout
//!
//! ```text
//! <workload>/
//!   perfmon/pmc_perf.txt        scheduled specification
//!   perfmon/pmc_perf_<i>.txt    split specifications
//!   perfmon/<LEVEL>.txt         isolated level counters
//!   pmc_perf_<i>.csv            per-pass results
//!   pmc_perf.csv                unified result table
//! ```

use std::path::{Path, PathBuf};

pub const PERFMON_DIR: &str = "perfmon";
pub const PERF_STEM: &str = "pmc_perf";

pub fn perfmon_dir(workload: &Path) -> PathBuf {
    workload.join(PERFMON_DIR)
}

pub fn scheduled_spec_path(workload: &Path) -> PathBuf {
    perfmon_dir(workload).join(format!("{}.txt", PERF_STEM))
}

pub fn pass_spec_path(workload: &Path, pass: usize) -> PathBuf {
    perfmon_dir(workload).join(format!("{}_{}.txt", PERF_STEM, pass))
}

pub fn level_spec_path(workload: &Path, level: &str) -> PathBuf {
    perfmon_dir(workload).join(format!("{}.txt", level))
}

pub fn pass_table_path(workload: &Path, pass: usize) -> PathBuf {
    workload.join(format!("{}_{}.csv", PERF_STEM, pass))
}

pub fn unified_table_path(workload: &Path) -> PathBuf {
    workload.join(format!("{}.csv", PERF_STEM))
}

/// Pass index of a `pmc_perf_<i>.<ext>` file name
pub fn pass_index(file_name: &str, ext: &str) -> Option<usize> {
    file_name
        .strip_prefix(PERF_STEM)?
        .strip_prefix('_')?
        .strip_suffix(ext)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let w = Path::new("/tmp/run");
        assert_eq!(scheduled_spec_path(w), Path::new("/tmp/run/perfmon/pmc_perf.txt"));
        assert_eq!(pass_spec_path(w, 3), Path::new("/tmp/run/perfmon/pmc_perf_3.txt"));
        assert_eq!(
            level_spec_path(w, "SQ_LEVEL_WAVES"),
            Path::new("/tmp/run/perfmon/SQ_LEVEL_WAVES.txt")
        );
        assert_eq!(pass_table_path(w, 0), Path::new("/tmp/run/pmc_perf_0.csv"));
        assert_eq!(unified_table_path(w), Path::new("/tmp/run/pmc_perf.csv"));
    }

    #[test]
    fn test_pass_index() {
        assert_eq!(pass_index("pmc_perf_0.csv", "csv"), Some(0));
        assert_eq!(pass_index("pmc_perf_12.csv", "csv"), Some(12));
        assert_eq!(pass_index("pmc_perf.csv", "csv"), None);
        assert_eq!(pass_index("pmc_perf_1.txt", "csv"), None);
        assert_eq!(pass_index("pmc_perf_x.csv", "csv"), None);
    }
}
