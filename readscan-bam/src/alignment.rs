//! Projection of read windows onto the reference through the CIGAR and MD tag.
use crate::read::OpKind;

///
/// A mismatched aligned base reported by the MD tag.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// 1-based reference position
    pub ref_pos: u64,
    /// offset into the stored read sequence
    pub read_offset: usize,
    pub ref_base: u8,
}

///
/// Reference segments (1-based, inclusive) covered by the read bases
/// `read_start..read_end`. Deletions stay inside a segment; a skip (`N`) closes it.
///
/// # Arguments
/// - start: 1-based alignment start of the read
/// - cigar: CIGAR operations of the read
/// - read_start: first read offset of the window
/// - read_end: read offset one past the window
///
pub fn window_segments(
    start: u64,
    cigar: &[(OpKind, usize)],
    read_start: usize,
    read_end: usize,
) -> Vec<(u64, u64)> {
    let mut segments = Vec::new();
    let mut current: Option<(u64, u64)> = None;

    let mut ref_pos = start;
    let mut read_pos = 0usize;

    for &(kind, len) in cigar {
        match kind {
            OpKind::Match => {
                let window_start = read_pos.max(read_start);
                let window_end = (read_pos + len).min(read_end);
                if window_start < window_end {
                    let seg_start = ref_pos + (window_start - read_pos) as u64;
                    let seg_end = ref_pos + (window_end - read_pos) as u64 - 1;
                    current = Some(match current {
                        Some((open, _)) => (open, seg_end),
                        None => (seg_start, seg_end),
                    });
                }
                read_pos += len;
                ref_pos += len as u64;
            }
            OpKind::Insertion | OpKind::SoftClip => read_pos += len,
            OpKind::Deletion => ref_pos += len as u64,
            OpKind::Skip => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
                ref_pos += len as u64;
            }
            OpKind::HardClip | OpKind::Pad => {}
        }

        if read_pos >= read_end {
            break;
        }
    }

    if let Some(segment) = current {
        segments.push(segment);
    }

    segments
}

///
/// Render the location of a read window, `chr:s-e` segments joined by `|`.
/// Returns `None` when no base of the window is aligned (e.g. it sits in a soft clip).
///
pub fn window_location(
    chr: &str,
    start: u64,
    cigar: &[(OpKind, usize)],
    read_start: usize,
    read_end: usize,
) -> Option<String> {
    let segments = window_segments(start, cigar, read_start, read_end);
    if segments.is_empty() {
        return None;
    }

    Some(
        segments
            .iter()
            .map(|(s, e)| format!("{}:{}-{}", chr, s, e))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

///
/// Walk an MD tag against the CIGAR and report every mismatched aligned base.
/// Malformed characters are skipped.
///
pub fn md_mismatches(md: &str, start: u64, cigar: &[(OpKind, usize)]) -> Vec<Mismatch> {
    // reference positions the MD tag describes, in order: aligned bases carry
    // their read offset, deleted bases carry none
    let mut described: Vec<(u64, Option<usize>)> = Vec::new();
    let mut ref_pos = start;
    let mut read_pos = 0usize;
    for &(kind, len) in cigar {
        match kind {
            OpKind::Match => {
                for i in 0..len {
                    described.push((ref_pos + i as u64, Some(read_pos + i)));
                }
                read_pos += len;
                ref_pos += len as u64;
            }
            OpKind::Deletion => {
                for i in 0..len {
                    described.push((ref_pos + i as u64, None));
                }
                ref_pos += len as u64;
            }
            OpKind::Skip => ref_pos += len as u64,
            OpKind::Insertion | OpKind::SoftClip => read_pos += len,
            OpKind::HardClip | OpKind::Pad => {}
        }
    }

    let bytes = md.as_bytes();
    let mut mismatches = Vec::new();
    let mut cursor = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            let mut run = 0usize;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                run = run * 10 + (bytes[i] - b'0') as usize;
                i += 1;
            }
            cursor += run;
        } else if b == b'^' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                cursor += 1;
                i += 1;
            }
        } else if b.is_ascii_alphabetic() {
            if let Some(&(ref_pos, Some(read_offset))) = described.get(cursor) {
                mismatches.push(Mismatch {
                    ref_pos,
                    read_offset,
                    ref_base: b.to_ascii_uppercase(),
                });
            }
            cursor += 1;
            i += 1;
        } else {
            i += 1;
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(vec![(OpKind::Match, 20)], 0, 9, vec![(100, 108)])]
    #[case(vec![(OpKind::Match, 20)], 5, 10, vec![(105, 109)])]
    #[case(vec![(OpKind::SoftClip, 3), (OpKind::Match, 17)], 3, 9, vec![(100, 105)])]
    #[case(vec![(OpKind::Match, 10), (OpKind::Deletion, 2), (OpKind::Match, 10)], 8, 12, vec![(108, 113)])]
    #[case(vec![(OpKind::Match, 10), (OpKind::Skip, 50), (OpKind::Match, 10)], 5, 15, vec![(105, 109), (160, 164)])]
    #[case(vec![(OpKind::Match, 10), (OpKind::Insertion, 2), (OpKind::Match, 10)], 8, 14, vec![(108, 111)])]
    fn test_window_segments(
        #[case] cigar: Vec<(OpKind, usize)>,
        #[case] read_start: usize,
        #[case] read_end: usize,
        #[case] expected: Vec<(u64, u64)>,
    ) {
        assert_eq!(window_segments(100, &cigar, read_start, read_end), expected);
    }

    #[rstest]
    fn test_window_location_spliced() {
        let cigar = vec![(OpKind::Match, 10), (OpKind::Skip, 50), (OpKind::Match, 10)];
        assert_eq!(
            window_location("chr1", 100, &cigar, 5, 15),
            Some("chr1:105-109|chr1:160-164".to_string())
        );
    }

    #[rstest]
    fn test_window_location_in_soft_clip() {
        let cigar = vec![(OpKind::SoftClip, 5), (OpKind::Match, 10)];
        assert_eq!(window_location("chr1", 100, &cigar, 0, 5), None);
    }

    #[rstest]
    fn test_md_mismatches_simple() {
        let cigar = vec![(OpKind::Match, 20)];
        let mismatches = md_mismatches("5A10C3", 100, &cigar);
        assert_eq!(
            mismatches,
            vec![
                Mismatch {
                    ref_pos: 105,
                    read_offset: 5,
                    ref_base: b'A'
                },
                Mismatch {
                    ref_pos: 116,
                    read_offset: 16,
                    ref_base: b'C'
                },
            ]
        );
    }

    #[rstest]
    fn test_md_mismatches_across_deletion_and_clip() {
        let cigar = vec![
            (OpKind::SoftClip, 2),
            (OpKind::Match, 5),
            (OpKind::Deletion, 2),
            (OpKind::Match, 5),
        ];
        let mismatches = md_mismatches("5^TT0G4", 100, &cigar);
        assert_eq!(
            mismatches,
            vec![Mismatch {
                ref_pos: 107,
                read_offset: 7,
                ref_base: b'G'
            }]
        );
    }

    #[rstest]
    fn test_md_without_mismatches() {
        let cigar = vec![(OpKind::Match, 20)];
        assert!(md_mismatches("20", 100, &cigar).is_empty());
    }
}
