use std::fmt::{self, Display};

use crate::consts::NULL_TOKENS;
use crate::errors::{ReadScanError, Result};
use crate::utils::canonical_chromosome;

///
/// GenomicRegion struct, the span a target query is expected at.
/// Coordinates are 1-based and inclusive.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct GenomicRegion {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicRegion {
    ///
    /// Parse a location cell into a region.
    ///
    /// Multi-segment locations (`chr1:10-20|chr1:40-50`, as produced for spliced
    /// alignments) collapse to one region spanning the smallest start and the
    /// largest end. Null cells (`-`, `NULL`, ...) yield `None`.
    ///
    /// # Arguments
    /// - loci: the raw location string
    pub fn parse_loci(loci: &str) -> Result<Option<Self>> {
        let loci = loci.trim();
        if NULL_TOKENS.contains(&loci.to_lowercase().as_str()) {
            return Ok(None);
        }

        let mut chr: Option<&str> = None;
        let mut start = u64::MAX;
        let mut end = 0_u64;

        for locus in loci.split('|') {
            let (locus_chr, span) = locus
                .rsplit_once(':')
                .ok_or_else(|| malformed(loci, "missing `:` between chromosome and span"))?;
            let (locus_start, locus_end) = span
                .split_once('-')
                .ok_or_else(|| malformed(loci, "missing `-` between start and end"))?;

            let locus_start = locus_start
                .trim()
                .parse::<u64>()
                .map_err(|_| malformed(loci, "start is not an integer"))?;
            let locus_end = locus_end
                .trim()
                .parse::<u64>()
                .map_err(|_| malformed(loci, "end is not an integer"))?;

            if locus_chr.is_empty() {
                return Err(malformed(loci, "empty chromosome name"));
            }

            chr = Some(locus_chr);
            start = start.min(locus_start);
            end = end.max(locus_end);
        }

        let chr = chr.ok_or_else(|| malformed(loci, "no loci"))?;

        Ok(Some(GenomicRegion {
            chr: canonical_chromosome(chr),
            start,
            end,
        }))
    }

    pub fn width(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }
}

fn malformed(loci: &str, reason: &str) -> ReadScanError {
    ReadScanError::InputFormat(format!("Malformed location `{}`: {}", loci, reason))
}

impl Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}
