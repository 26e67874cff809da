//! Counter specification sources
//!
//! Sources are where the coalescer reads counter requests from. The CLI
//! uses files from a counter-definition directory; tests use inline text.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Something that yields counter specification text
pub trait SpecSource {
    /// Name used in log and error messages
    fn name(&self) -> String;

    /// Read the full specification text
    fn read(&self) -> std::io::Result<String>;
}

/// Specification file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpecSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> std::io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Specification held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSource {
    pub name: String,
    pub text: String,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl SpecSource for InlineSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read(&self) -> std::io::Result<String> {
        Ok(self.text.clone())
    }
}

/// Which counter-definition files feed a scheduling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every definition file, optionally restricted to some IP blocks
    All { ip_blocks: Option<Vec<String>> },

    /// Only the roofline counter set
    Roofline,
}

const ROOFLINE_DIR: &str = "roofline";
const ROOFLINE_SPEC: &str = "pmc_roof_perf.txt";

/// Stem between `pmc_` and `.txt`
fn spec_stem(file_name: &str) -> Option<&str> {
    file_name.strip_prefix("pmc_")?.strip_suffix(".txt")
}

/// IP block named by a `pmc_<block>_perf...` stem
fn ip_block_of(stem: &str) -> Option<&str> {
    let idx = stem.rfind("_perf")?;
    let block = &stem[..idx];
    if block.is_empty() || !block.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    Some(block)
}

/// Files in `dir` whose stem satisfies `keep`, sorted by path
fn list_specs(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(spec_stem)
            .is_some_and(&keep);
        if matches && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Select the definition files under `perfmon_dir` for `arch`
pub fn select_sources(
    perfmon_dir: &Path,
    arch: &str,
    selection: &Selection,
) -> Result<Vec<FileSource>> {
    let ip_blocks = match selection {
        Selection::Roofline => {
            let path = perfmon_dir.join(ROOFLINE_DIR).join(ROOFLINE_SPEC);
            if !path.is_file() {
                anyhow::bail!("Roofline counter set not found: {}", path.display());
            }
            return Ok(vec![FileSource::new(path)]);
        }
        Selection::All { ip_blocks } => ip_blocks,
    };

    let mut paths = list_specs(perfmon_dir, |stem| stem.contains("perf"))?;
    paths.extend(list_specs(&perfmon_dir.join(arch), |stem| stem.contains("_perf"))?);

    let Some(wanted) = ip_blocks else {
        info!("Selected {} counter definition files", paths.len());
        return Ok(paths.into_iter().map(FileSource::new).collect());
    };

    let wanted: Vec<String> = wanted.iter().map(|b| b.to_lowercase()).collect();
    let mut selected = Vec::new();
    for path in paths {
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(spec_stem)
            .unwrap_or_default();
        match ip_block_of(stem) {
            Some(block) if wanted.iter().any(|w| w == block) => {
                info!("{}: added", stem);
                selected.push(FileSource::new(path));
            }
            Some(_) => info!("{}: skipped", stem),
            None => debug!("{}: no IP block in name, skipped", stem),
        }
    }
    Ok(selected)
}
