//! Read-level matching rules: count policy, transcript strand, window search,
//! read-of-interest error filter and tuple construction.
use std::borrow::Cow;

use fxhash::FxHashSet;

use readscan_core::config::{CountPolicy, SequenceType, Strandedness};
use readscan_core::consts::{EMPTY_FIELD, MISSING_QUALITY, UNMAPPED_LOCATION};
use readscan_core::matcher::{MatchContext, QuerySet, StrandTally};
use readscan_core::models::{LocationInformation, Strand};
use readscan_core::utils::{reverse_complement_bytes, translate_bytes};

use crate::alignment::{md_mismatches, window_location};
use crate::read::{AlignedRead, ReadFlags};

///
/// A query sequence found inside a read.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// the matched query, as stored in the query set
    pub query: Vec<u8>,
    /// window in stored (reference-orientation) read coordinates
    pub read_start: usize,
    pub read_end: usize,
    /// orientation the window was read in
    pub orientation: Strand,
}

pub fn passes_count_policy(flags: &ReadFlags, policy: CountPolicy) -> bool {
    match policy {
        CountPolicy::Primary => !flags.secondary && !flags.supplementary,
        CountPolicy::All => true,
    }
}

///
/// Strand of the transcript a read derives from under the given library
/// strandedness. `Strand::None` means either strand is possible.
///
pub fn transcript_strand(flags: &ReadFlags, strandedness: Strandedness) -> Strand {
    if flags.unmapped {
        return Strand::None;
    }

    let aligned = if flags.reverse {
        Strand::Reverse
    } else {
        Strand::Forward
    };
    let second_mate = flags.paired && flags.last;

    match strandedness {
        Strandedness::Non | Strandedness::Auto => Strand::None,
        Strandedness::F => aligned,
        Strandedness::R => aligned.flip(),
        Strandedness::Fr if second_mate => aligned.flip(),
        Strandedness::Fr => aligned,
        Strandedness::Rf if second_mate => aligned,
        Strandedness::Rf => aligned.flip(),
    }
}

/// Orientations a read must be searched in for a transcript strand.
pub fn orientations(transcript: Strand) -> &'static [Strand] {
    match transcript {
        Strand::Forward => &[Strand::Forward],
        Strand::Reverse => &[Strand::Reverse],
        Strand::None => &[Strand::Forward, Strand::Reverse],
    }
}

///
/// Add a read to the mate orientation tally. Only primary, mapped, paired
/// reads with a known `XS` strand are tallied; returns whether the read was.
///
pub fn tally_read(read: &AlignedRead, tally: &mut StrandTally) -> bool {
    if read.flags.unmapped || !read.flags.paired || !read.is_primary() {
        return false;
    }
    let Some(xs) = read.xs else {
        return false;
    };

    let aligned = if read.flags.reverse {
        Strand::Reverse
    } else {
        Strand::Forward
    };
    let agrees = aligned == xs;

    match (read.flags.first, read.flags.last, agrees) {
        (true, false, true) => tally.r1f += 1,
        (true, false, false) => tally.r1r += 1,
        (false, true, true) => tally.r2f += 1,
        (false, true, false) => tally.r2r += 1,
        _ => return false,
    }
    true
}

///
/// Find every query occurrence in a read sequence. Nucleotide queries are
/// searched directly; peptide queries in the three forward frames of each
/// permitted orientation.
///
pub fn find_hits(
    sequence: &[u8],
    permitted: &[Strand],
    queries: &QuerySet,
    context: &MatchContext,
) -> Vec<Hit> {
    let mut hits = Vec::new();
    if queries.is_empty() {
        return hits;
    }
    let read_len = sequence.len();

    for &orientation in permitted {
        let oriented: Cow<[u8]> = match orientation {
            Strand::Reverse => Cow::Owned(reverse_complement_bytes(sequence)),
            _ => Cow::Borrowed(sequence),
        };

        // (window start, window length) in oriented coordinates
        let mut found: Vec<(Vec<u8>, usize, usize)> = Vec::new();
        match context.sequence_type {
            SequenceType::Nucleotide => {
                for &len in queries.lengths() {
                    if len > oriented.len() {
                        break;
                    }
                    for i in 0..=oriented.len() - len {
                        let window = &oriented[i..i + len];
                        if queries.contains(window) {
                            found.push((window.to_vec(), i, len));
                        }
                    }
                }
            }
            SequenceType::Peptide => {
                for frame in 0..3 {
                    if frame + 3 > oriented.len() {
                        break;
                    }
                    let mut peptide = translate_bytes(&oriented[frame..]);
                    if context.il_equal {
                        for residue in peptide.iter_mut() {
                            if *residue == b'I' {
                                *residue = b'L';
                            }
                        }
                    }
                    for &len in queries.lengths() {
                        if len > peptide.len() {
                            break;
                        }
                        for j in 0..=peptide.len() - len {
                            let window = &peptide[j..j + len];
                            if queries.contains(window) {
                                found.push((window.to_vec(), frame + 3 * j, 3 * len));
                            }
                        }
                    }
                }
            }
        }

        for (query, start, len) in found {
            let (read_start, read_end) = match orientation {
                Strand::Reverse => (read_len - (start + len), read_len - start),
                _ => (start, start + len),
            };
            hits.push(Hit {
                query,
                read_start,
                read_end,
                orientation,
            });
        }
    }

    hits
}

///
/// Probability that at least one base of the window was miscalled:
/// `1 - Π(1 - 10^(-q/10))`. Reads without base qualities are never filtered.
///
pub fn window_error_probability(qualities: &[u8], read_start: usize, read_end: usize) -> f64 {
    if qualities.is_empty() || qualities[0] == MISSING_QUALITY || read_end > qualities.len() {
        return 0.0;
    }

    let correct: f64 = qualities[read_start..read_end]
        .iter()
        .map(|&q| 1.0 - 10f64.powf(-(q as f64) / 10.0))
        .product();

    1.0 - correct
}

///
/// Build the tuple for a hit: observed and reference bases in the hit's
/// orientation, genomic location and mutations.
///
pub fn locate_hit(read: &AlignedRead, hit: &Hit) -> LocationInformation {
    let window = &read.sequence[hit.read_start..hit.read_end];
    let mut reference = window.to_vec();
    let mut mutations = Vec::new();

    let placement = match (&read.chr, read.start) {
        (Some(chr), Some(start)) if read.is_placed() => {
            window_location(chr, start, &read.cigar, hit.read_start, hit.read_end)
                .map(|location| (chr, start, location))
        }
        _ => None,
    };

    let location = match placement {
        Some((chr, start, location)) => {
            if let Some(md) = read.md.as_deref() {
                for mismatch in md_mismatches(md, start, &read.cigar) {
                    if mismatch.read_offset < hit.read_start || mismatch.read_offset >= hit.read_end {
                        continue;
                    }
                    let observed = read.sequence[mismatch.read_offset];
                    mutations.push(format!(
                        "{}:{}:{}>{}",
                        chr, mismatch.ref_pos, mismatch.ref_base as char, observed as char
                    ));
                    reference[mismatch.read_offset - hit.read_start] = mismatch.ref_base;
                }
            }
            location
        }
        None => UNMAPPED_LOCATION.to_string(),
    };

    let (observed, reference) = match hit.orientation {
        Strand::Reverse => (
            reverse_complement_bytes(window),
            reverse_complement_bytes(&reference),
        ),
        _ => (window.to_vec(), reference),
    };

    let obs_peptide = if !observed.is_empty() && observed.len() % 3 == 0 {
        String::from_utf8_lossy(&translate_bytes(&observed)).into_owned()
    } else {
        EMPTY_FIELD.to_string()
    };

    LocationInformation {
        query: String::from_utf8_lossy(&hit.query).into_owned(),
        obs_nucleotide: String::from_utf8_lossy(&observed).into_owned(),
        obs_peptide,
        location,
        strand: hit.orientation,
        mutations,
        ref_nucleotide: String::from_utf8_lossy(&reference).into_owned(),
        read_count: 1,
    }
}

///
/// Tuples a single read supports: hits passing the error filter, located, with
/// at most one tuple per (query, location). A query that is its own reverse
/// complement matches the same window in both orientations; the first
/// permitted orientation wins.
///
pub fn read_locations(
    read: &AlignedRead,
    permitted: &[Strand],
    queries: &QuerySet,
    context: &MatchContext,
) -> Vec<LocationInformation> {
    let mut seen: FxHashSet<(Vec<u8>, String)> = FxHashSet::default();
    let mut located = Vec::new();

    for hit in find_hits(&read.sequence, permitted, queries, context) {
        let error = window_error_probability(&read.qualities, hit.read_start, hit.read_end);
        if error > context.roi_error_threshold {
            continue;
        }
        let info = locate_hit(read, &hit);
        if seen.insert((hit.query, info.location.clone())) {
            located.push(info);
        }
    }

    located
}
