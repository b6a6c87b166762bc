use crate::config::Mode;
use crate::consts::EMPTY_FIELD;
use crate::models::{GenomicRegion, Strand};
use crate::utils::reverse_sequence;

///
/// IndexedRecord struct, one canonical query sequence of the input table.
///
/// Input rows sharing the same canonical key are folded into a single record;
/// `raw_lines` keeps every one of them in input order.
///
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub sequence: String,
    pub strand: Strand,
    pub region: Option<GenomicRegion>,
    pub is_decoy: bool,
    pub raw_lines: Vec<String>,
    pub read_count: u64,
}

impl IndexedRecord {
    pub fn new(sequence: String, strand: Strand, region: Option<GenomicRegion>) -> Self {
        IndexedRecord {
            sequence,
            strand,
            region,
            is_decoy: false,
            raw_lines: Vec::new(),
            read_count: 0,
        }
    }

    ///
    /// Build the reversed-sequence negative control of this record.
    /// Decoys carry no raw lines: they only ever surface in the decoy summary.
    ///
    pub fn to_decoy(&self) -> Self {
        IndexedRecord {
            sequence: reverse_sequence(&self.sequence),
            strand: Strand::None,
            region: None,
            is_decoy: true,
            raw_lines: Vec::new(),
            read_count: 0,
        }
    }

    ///
    /// Canonical key of the record. Scan mode keys on the sequence alone,
    /// target mode on `sequence|strand|region`.
    ///
    pub fn key(&self, mode: Mode) -> String {
        match mode {
            Mode::Scan => self.sequence.clone(),
            Mode::Target => format!(
                "{}|{}|{}",
                self.sequence,
                self.strand,
                self.region
                    .as_ref()
                    .map_or(EMPTY_FIELD.to_string(), |region| region.to_string())
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_scan_key_is_sequence() {
        let record = IndexedRecord::new("PEPTIDE".to_string(), Strand::None, None);
        assert_eq!(record.key(Mode::Scan), "PEPTIDE");
    }

    #[rstest]
    fn test_target_key_includes_strand_and_region() {
        let region = GenomicRegion {
            chr: "chr1".to_string(),
            start: 10,
            end: 20,
        };
        let record = IndexedRecord::new("ACGT".to_string(), Strand::Reverse, Some(region));
        assert_eq!(record.key(Mode::Target), "ACGT|-|chr1:10-20");

        let record = IndexedRecord::new("ACGT".to_string(), Strand::Forward, None);
        assert_eq!(record.key(Mode::Target), "ACGT|+|-");
    }

    #[rstest]
    fn test_decoy_reverses_sequence() {
        let record = IndexedRecord::new("PEPTIDEK".to_string(), Strand::None, None);
        let decoy = record.to_decoy();
        assert_eq!(decoy.sequence, "KEDITPEP");
        assert!(decoy.is_decoy);
        assert!(decoy.raw_lines.is_empty());
    }
}
