//! Shared types and utilities for perfmux
//!
//! This crate contains the data structures used by both the pass scheduler
//! and the multi-pass recombiner: architecture profiles, counter records,
//! the counter specification file format and the library error types.

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, ParseError};
pub use types::{arch::*, counter::*, spec::*};
