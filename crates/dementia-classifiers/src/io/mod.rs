//! IO utilities for loading delimited feature tables.

pub mod delimited;

pub use delimited::{read_dataset, read_table};
