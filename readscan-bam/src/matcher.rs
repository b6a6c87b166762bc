use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use noodles::{bam, bgzf};
use noodles::core::Region;

use readscan_core::config::{CountPolicy, SequenceType};
use readscan_core::errors::{ReadScanError, Result};
use readscan_core::matcher::{AlignmentMatcher, MatchContext, Partition, QuerySet, StrandTally};
use readscan_core::models::{IndexedRecord, LocationTable, Strand};

use crate::matching::{
    find_hits, orientations, passes_count_policy, read_locations, tally_read, transcript_strand,
    window_error_probability,
};
use crate::read::AlignedRead;

///
/// [AlignmentMatcher] over a coordinate-sorted, indexed BAM file.
///
/// Every call opens its own reader, so partitions can be processed from many
/// threads at once.
///
pub struct BamMatcher {
    path: PathBuf,
    references: Vec<(String, u64)>,
}

impl BamMatcher {
    pub fn new(path: &Path) -> Result<Self> {
        let mut reader = bam::io::reader::Builder
            .build_from_path(path)
            .map_err(|e| {
                ReadScanError::Alignment(format!("cannot open {}: {}", path.display(), e))
            })?;
        let header = reader.read_header().map_err(|e| {
            ReadScanError::Alignment(format!("cannot read header of {}: {}", path.display(), e))
        })?;

        let references = header
            .reference_sequences()
            .iter()
            .map(|(name, reference)| (name.to_string(), reference.length().get() as u64))
            .collect::<Vec<_>>();

        debug!(
            "{} has {} reference sequences",
            path.display(),
            references.len()
        );

        Ok(BamMatcher {
            path: path.to_path_buf(),
            references,
        })
    }

    pub fn references(&self) -> &[(String, u64)] {
        &self.references
    }

    /// Header name of a reference, tolerating case differences.
    fn resolve_reference(&self, chr: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|(name, _)| name == chr)
            .or_else(|| {
                self.references
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(chr))
            })
            .map(|(name, _)| name.as_str())
    }

    fn open_indexed(&self) -> Result<bam::io::IndexedReader<bgzf::Reader<File>>> {
        bam::io::indexed_reader::Builder::default()
            .build_from_path(&self.path)
            .map_err(|e| {
                ReadScanError::Alignment(format!(
                    "cannot open indexed {} (is there a .bai file?): {}",
                    self.path.display(),
                    e
                ))
            })
    }

    ///
    /// Visit the reads overlapping `chr:start-end`. With `owned_only`, only reads
    /// whose alignment start lies in the window are visited. `visit` returns
    /// false to stop early.
    ///
    fn visit_region<F>(
        &self,
        chr: &str,
        start: u64,
        end: u64,
        owned_only: bool,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(AlignedRead) -> bool,
    {
        let mut reader = self.open_indexed()?;
        let header = reader.read_header()?;

        let region: Region = format!("{}:{}-{}", chr, start, end)
            .parse()
            .map_err(|e| ReadScanError::Alignment(format!("bad region {}: {}", chr, e)))?;

        let query = reader.query(&header, &region)?;
        for result in query {
            let record = result?;
            let read = AlignedRead::from_bam(&record, &header)?;

            if owned_only && !read.start.is_some_and(|s| (start..=end).contains(&s)) {
                continue;
            }
            if !visit(read) {
                break;
            }
        }

        Ok(())
    }

    ///
    /// Visit reads without a reference sequence. The index points past the last
    /// placed record, so only the unplaced tail of the file is read. Unmapped
    /// reads that still carry a placement belong to their region window.
    ///
    fn visit_unplaced<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(AlignedRead) -> bool,
    {
        let mut reader = self.open_indexed()?;
        let header = reader.read_header()?;

        for result in reader.query_unmapped()? {
            let record = result?;
            if record.reference_sequence_id().is_some() {
                continue;
            }
            let read = AlignedRead::from_bam(&record, &header)?;
            if !visit(read) {
                break;
            }
        }

        Ok(())
    }

    fn visit_partition<F>(&self, partition: &Partition, visit: F) -> Result<()>
    where
        F: FnMut(AlignedRead) -> bool,
    {
        match partition {
            Partition::Region { chr, start, end } => {
                self.visit_region(chr, *start, *end, true, visit)
            }
            Partition::Unmapped => self.visit_unplaced(visit),
        }
    }
}

///
/// Split every reference into consecutive windows of at most `window` bp,
/// followed by the unmapped partition.
///
pub fn window_partitions(references: &[(String, u64)], window: u64) -> Vec<Partition> {
    let mut partitions = Vec::new();
    for (chr, length) in references {
        let mut start = 1u64;
        while start <= *length {
            let end = start.saturating_add(window - 1).min(*length);
            partitions.push(Partition::Region {
                chr: chr.clone(),
                start,
                end,
            });
            start = end + 1;
        }
    }
    partitions.push(Partition::Unmapped);
    partitions
}

impl AlignmentMatcher for BamMatcher {
    fn partitions(&self, window: u64) -> Result<Vec<Partition>> {
        if window == 0 {
            return Err(ReadScanError::Config(
                "scan window must be greater than 0".to_string(),
            ));
        }
        Ok(window_partitions(&self.references, window))
    }

    fn count_reads(&self, partition: &Partition, policy: CountPolicy) -> Result<u64> {
        let mut reads = 0u64;
        self.visit_partition(partition, |read| {
            if passes_count_policy(&read.flags, policy) {
                reads += 1;
            }
            true
        })?;
        Ok(reads)
    }

    fn tally_orientation(&self, partition: &Partition, sample_size: u64) -> Result<StrandTally> {
        let mut tally = StrandTally::default();
        if partition.is_unmapped() {
            return Ok(tally);
        }

        self.visit_partition(partition, |read| {
            tally_read(&read, &mut tally);
            tally.total() < sample_size
        })?;
        Ok(tally)
    }

    fn scan_partition(
        &self,
        partition: &Partition,
        queries: &QuerySet,
        context: &MatchContext,
        table: &mut LocationTable,
    ) -> Result<u64> {
        let mut processed = 0u64;

        self.visit_partition(partition, |read| {
            if !passes_count_policy(&read.flags, context.count) {
                return true;
            }
            processed += 1;

            let transcript = transcript_strand(&read.flags, context.strandedness);
            for info in read_locations(&read, orientations(transcript), queries, context) {
                table.put_location(info);
            }
            true
        })?;

        Ok(processed)
    }

    fn count_target(&self, record: &IndexedRecord, context: &MatchContext) -> Result<u64> {
        let Some(region) = &record.region else {
            return Ok(0);
        };
        let Some(chr) = self.resolve_reference(&region.chr) else {
            debug!("{} is not a reference sequence of the alignment file", region.chr);
            return Ok(0);
        };

        let queries = QuerySet::new([record.sequence.as_str()]);
        let mut reads = 0u64;

        self.visit_region(chr, region.start, region.end, false, |read| {
            if read.flags.unmapped || !passes_count_policy(&read.flags, context.count) {
                return true;
            }

            let transcript = transcript_strand(&read.flags, context.strandedness);
            if record.strand.is_known() && transcript.is_known() && transcript != record.strand {
                return true;
            }

            // nucleotide targets are stored in reference orientation already
            let permitted = match (context.sequence_type, record.strand) {
                (_, Strand::None) => orientations(transcript),
                (SequenceType::Nucleotide, _) => orientations(Strand::Forward),
                (SequenceType::Peptide, strand) => orientations(strand),
            };

            let supported = find_hits(&read.sequence, permitted, &queries, context)
                .iter()
                .any(|hit| {
                    window_error_probability(&read.qualities, hit.read_start, hit.read_end)
                        <= context.roi_error_threshold
                });
            if supported {
                reads += 1;
            }
            true
        })?;

        Ok(reads)
    }
}
