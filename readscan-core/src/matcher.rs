//! The seam between the counting engine and whatever reads the alignments.
//!
//! The engine never decodes alignments itself. It hands an [AlignmentMatcher]
//! independent [Partition]s of the alignment source and asks it to count reads,
//! tally mate orientations, or scan for query sequences. Implementations must
//! allow many partitions to be processed at once (each call opens its own handle).
use std::fmt::{self, Display};
use std::ops::{Add, AddAssign};

use fxhash::FxHashSet;

use crate::config::{CountPolicy, ScanConfig, SequenceType, Strandedness};
use crate::errors::Result;
use crate::models::{IndexedRecord, LocationTable};

///
/// One independently scannable slice of the alignment source.
///
/// A region partition owns exactly the reads whose alignment start lies in
/// `start..=end` (1-based), so partitions of one reference never share a read.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Partition {
    Region { chr: String, start: u64, end: u64 },
    Unmapped,
}

impl Partition {
    pub fn is_unmapped(&self) -> bool {
        matches!(self, Partition::Unmapped)
    }

    pub fn owns_start(&self, position: u64) -> bool {
        match self {
            Partition::Region { start, end, .. } => (*start..=*end).contains(&position),
            Partition::Unmapped => false,
        }
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Region { chr, start, end } => write!(f, "{}:{}-{}", chr, start, end),
            Partition::Unmapped => write!(f, "unmapped"),
        }
    }
}

///
/// Mate orientation tallies relative to the transcript strand (`XS` tag).
/// `r1f` counts first mates aligned in the transcript's orientation, `r1r` first
/// mates aligned against it, and likewise for second mates.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrandTally {
    pub r1f: u64,
    pub r1r: u64,
    pub r2f: u64,
    pub r2r: u64,
}

impl StrandTally {
    pub fn total(&self) -> u64 {
        self.r1f + self.r1r + self.r2f + self.r2r
    }
}

impl Add for StrandTally {
    type Output = StrandTally;

    fn add(self, other: StrandTally) -> StrandTally {
        StrandTally {
            r1f: self.r1f + other.r1f,
            r1r: self.r1r + other.r1r,
            r2f: self.r2f + other.r2f,
            r2r: self.r2r + other.r2r,
        }
    }
}

impl AddAssign for StrandTally {
    fn add_assign(&mut self, other: StrandTally) {
        *self = *self + other;
    }
}

///
/// The set of query sequences a scan looks for, indexed by length so a read
/// only needs one hash lookup per window.
///
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    sequences: FxHashSet<Vec<u8>>,
    lengths: Vec<usize>,
}

impl QuerySet {
    pub fn new<I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sequences: FxHashSet<Vec<u8>> = sequences
            .into_iter()
            .map(|s| s.as_ref().as_bytes().to_vec())
            .filter(|s| !s.is_empty())
            .collect();
        let mut lengths: Vec<usize> = sequences.iter().map(|s| s.len()).collect();
        lengths.sort_unstable();
        lengths.dedup();

        QuerySet { sequences, lengths }
    }

    /// Every record's sequence, real and decoy.
    pub fn from_records(records: &[IndexedRecord]) -> Self {
        QuerySet::new(records.iter().map(|record| record.sequence.as_str()))
    }

    pub fn contains(&self, window: &[u8]) -> bool {
        self.sequences.contains(window)
    }

    /// Distinct query lengths, ascending.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

///
/// Matching parameters shared by every scan/target task of a run. The
/// strandedness here is always resolved (never `Auto`) once work tasks run.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchContext {
    pub sequence_type: SequenceType,
    pub strandedness: Strandedness,
    pub count: CountPolicy,
    pub roi_error_threshold: f64,
    pub il_equal: bool,
}

impl MatchContext {
    pub fn new(config: &ScanConfig, strandedness: Strandedness) -> Self {
        MatchContext {
            sequence_type: config.sequence_type,
            strandedness,
            count: config.count,
            roi_error_threshold: config.roi_error_threshold,
            il_equal: config.il_equal,
        }
    }
}

pub trait AlignmentMatcher: Send + Sync {
    ///
    /// Split the alignment source into partitions that can be processed in parallel.
    ///
    fn partitions(&self, window: u64) -> Result<Vec<Partition>>;

    ///
    /// Number of reads in a partition that pass the count policy.
    ///
    fn count_reads(&self, partition: &Partition, policy: CountPolicy) -> Result<u64>;

    ///
    /// Tally mate orientations against the transcript strand, stopping after
    /// `sample_size` tallied mates.
    ///
    fn tally_orientation(&self, partition: &Partition, sample_size: u64) -> Result<StrandTally>;

    ///
    /// Scan every read of a partition for the query sequences, filing one tuple
    /// per match into `table`. Returns the number of reads that passed the
    /// count policy.
    ///
    fn scan_partition(
        &self,
        partition: &Partition,
        queries: &QuerySet,
        context: &MatchContext,
        table: &mut LocationTable,
    ) -> Result<u64>;

    ///
    /// Number of reads at a target record's region that support its sequence.
    ///
    fn count_target(&self, record: &IndexedRecord, context: &MatchContext) -> Result<u64>;
}
