//! Core models and shared utilities for readscan.
//!
//! Everything the counting engine and the alignment matcher have to agree on lives
//! here: the indexed query records, the location tuples discovered by scanning, the
//! per-task [LocationTable](models::LocationTable), the run configuration and the
//! [AlignmentMatcher](matcher::AlignmentMatcher) seam between the two.
pub mod config;
pub mod consts;
pub mod errors;
pub mod matcher;
pub mod memory;
pub mod models;
pub mod utils;

// re-exports
pub use errors::{ReadScanError, Result};
