//! Join configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::key::JoinStrategy;
use crate::JoinError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// How dispatches are matched across passes. There is no default; a
    /// join without a named strategy is rejected.
    pub strategy: Option<JoinStrategy>,

    /// Delete the per-pass tables after a successful join
    pub remove_inputs: bool,

    /// Unified table path (default `<workload>/pmc_perf.csv`)
    pub output: Option<PathBuf>,
}

impl JoinConfig {
    pub fn new(strategy: JoinStrategy) -> Self {
        Self {
            strategy: Some(strategy),
            ..Default::default()
        }
    }

    /// The named strategy
    pub fn strategy(&self) -> Result<JoinStrategy, JoinError> {
        self.strategy.ok_or(JoinError::StrategyRequired)
    }
}
