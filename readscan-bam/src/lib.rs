//! Alignment matcher over indexed BAM files.
//!
//! You must provide a .bai file alongside the bam file! Create one: `samtools index your_file.bam`
pub mod alignment;
pub mod matcher;
pub mod matching;
pub mod read;

// re-exports
pub use matcher::BamMatcher;
pub use read::{AlignedRead, OpKind, ReadFlags};
