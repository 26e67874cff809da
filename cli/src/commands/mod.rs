pub mod archs;
pub mod join;
pub mod schedule;
pub mod split;
