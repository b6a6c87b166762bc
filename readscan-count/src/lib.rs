//! # readscan-count
//!
//! The counting engine: index the query table, schedule tasks over an
//! [AlignmentMatcher](readscan_core::matcher::AlignmentMatcher) on a bounded
//! worker pool, merge the per-task location tables and project the merged
//! result into the derived output views.
//!
//! ## Example
//! ```rust,ignore
//! use std::path::Path;
//! use readscan_core::config::ScanConfig;
//! use readscan_count::run_readscan;
//!
//! let config = ScanConfig::default();
//! let summary = run_readscan(&config, Path::new("queries.tsv"), &matcher, Path::new("out.tsv"))?;
//! println!("library size: {}", summary.library_size);
//! ```
pub mod aggregate;
pub mod index;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod scheduler;
pub mod strand;
pub mod task;

// re-exports
pub use index::RecordIndex;
pub use pipeline::{RunSummary, run_readscan};
pub use scheduler::WorkerPool;
pub use task::{Task, TaskKind, TaskReport};
