//! Core data types

pub mod arch;
pub mod counter;
pub mod spec;
