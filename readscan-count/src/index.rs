use std::io::BufRead;
use std::path::Path;

use fxhash::{FxHashMap, FxHashSet};
use log::info;

use readscan_core::config::{Mode, ScanConfig, SequenceType};
use readscan_core::consts::{LOCATION_COLUMN, NUCLEOTIDE_COLUMNS, PEPTIDE_COLUMNS, STRAND_COLUMN};
use readscan_core::errors::{ReadScanError, Result};
use readscan_core::models::{GenomicRegion, IndexedRecord, Strand};
use readscan_core::utils::{collapse_isoleucine, get_dynamic_reader, reverse_complement};

///
/// Column positions picked from the header row.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    sequence: usize,
    location: Option<usize>,
    strand: Option<usize>,
}

impl Columns {
    fn from_header(header: &str, config: &ScanConfig) -> Result<Self> {
        let names: Vec<String> = header
            .split('\t')
            .map(|name| name.trim().to_lowercase())
            .collect();
        let find = |candidates: &[&str]| names.iter().position(|name| candidates.contains(&name.as_str()));

        let sequence_names: &[&str] = match config.sequence_type {
            SequenceType::Nucleotide => &NUCLEOTIDE_COLUMNS,
            SequenceType::Peptide => &PEPTIDE_COLUMNS,
        };
        let sequence = find(sequence_names).ok_or_else(|| {
            ReadScanError::Config(format!(
                "no {} column in the input header (expected one of: {})",
                config.sequence_type,
                sequence_names.join(", ")
            ))
        })?;

        let (location, strand) = match config.mode {
            Mode::Target => {
                let location = find(&[LOCATION_COLUMN]).ok_or_else(|| {
                    ReadScanError::Config(format!(
                        "target mode needs a `{}` column in the input header",
                        LOCATION_COLUMN
                    ))
                })?;
                let strand = find(&[STRAND_COLUMN]).ok_or_else(|| {
                    ReadScanError::Config(format!(
                        "target mode needs a `{}` column in the input header",
                        STRAND_COLUMN
                    ))
                })?;
                (Some(location), Some(strand))
            }
            Mode::Scan => (None, None),
        };

        Ok(Columns {
            sequence,
            location,
            strand,
        })
    }

    fn width(&self) -> usize {
        [Some(self.sequence), self.location, self.strand]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(0)
            + 1
    }
}

///
/// RecordIndex struct, the canonicalized query table.
///
/// Real records come first in first-seen order, followed by decoys when they
/// were requested. Keys are unique across the whole index.
///
#[derive(Debug, Clone)]
pub struct RecordIndex {
    pub header: String,
    pub mode: Mode,
    pub records: Vec<IndexedRecord>,
    num_real: usize,
}

impl RecordIndex {
    ///
    /// Index a (possibly gzipped) tab-separated query table.
    ///
    pub fn from_path(path: &Path, config: &ScanConfig) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        Self::from_reader(reader, config)
    }

    pub fn from_reader<R: BufRead>(reader: R, config: &ScanConfig) -> Result<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(ReadScanError::InputFormat(
                    "the input table is empty (no header row)".to_string(),
                ));
            }
        };
        let header = header.trim_end_matches('\r').to_string();
        let columns = Columns::from_header(&header, config)?;

        let mut records: Vec<IndexedRecord> = Vec::new();
        let mut positions: FxHashMap<String, usize> = FxHashMap::default();
        let mut num_lines = 0usize;

        for (i, line) in lines.enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            // header is line 1
            let line_number = i + 2;
            num_lines += 1;

            let record = parse_row(line, line_number, &columns, config)?;
            let key = record.key(config.mode);
            match positions.get(&key) {
                Some(&position) => records[position].raw_lines.push(line.to_string()),
                None => {
                    let mut record = record;
                    record.raw_lines.push(line.to_string());
                    positions.insert(key, records.len());
                    records.push(record);
                }
            }
        }

        info!(
            "Indexed {} records from {} input rows",
            records.len(),
            num_lines
        );

        let num_real = records.len();
        let mut index = RecordIndex {
            header,
            mode: config.mode,
            records,
            num_real,
        };

        if config.decoy && config.mode == Mode::Scan {
            index.add_decoys();
        }

        Ok(index)
    }

    ///
    /// Append one reversed-sequence decoy per real record. Runs once every real
    /// record is indexed; decoys whose key equals a real key are skipped.
    ///
    fn add_decoys(&mut self) {
        let real_keys: FxHashSet<String> = self
            .real_records()
            .iter()
            .map(|record| record.key(self.mode))
            .collect();

        let decoys: Vec<IndexedRecord> = self
            .real_records()
            .iter()
            .map(|record| record.to_decoy())
            .filter(|decoy| !real_keys.contains(&decoy.key(self.mode)))
            .collect();

        info!("Generated {} decoy sequences", decoys.len());
        self.records.extend(decoys);
    }

    pub fn real_records(&self) -> &[IndexedRecord] {
        &self.records[..self.num_real]
    }

    pub fn decoy_records(&self) -> &[IndexedRecord] {
        &self.records[self.num_real..]
    }

    pub fn num_real(&self) -> usize {
        self.num_real
    }

    pub fn num_decoys(&self) -> usize {
        self.records.len() - self.num_real
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Prefix an input-format error with the line it was found on.
fn at_line(line_number: usize) -> impl Fn(ReadScanError) -> ReadScanError {
    move |e| match e {
        ReadScanError::InputFormat(reason) => {
            ReadScanError::InputFormat(format!("line {}: {}", line_number, reason))
        }
        other => other,
    }
}

fn parse_row(
    line: &str,
    line_number: usize,
    columns: &Columns,
    config: &ScanConfig,
) -> Result<IndexedRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < columns.width() {
        return Err(ReadScanError::InputFormat(format!(
            "line {} has {} columns, expected at least {}",
            line_number,
            fields.len(),
            columns.width()
        )));
    }

    let mut sequence = fields[columns.sequence].trim().to_uppercase();
    if sequence.is_empty() {
        return Err(ReadScanError::InputFormat(format!(
            "line {} has an empty sequence",
            line_number
        )));
    }

    match config.mode {
        Mode::Target => {
            let strand: Strand = match columns.strand {
                Some(column) => fields[column].parse().map_err(at_line(line_number))?,
                None => Strand::None,
            };
            let region = match columns.location {
                Some(column) => {
                    GenomicRegion::parse_loci(fields[column]).map_err(at_line(line_number))?
                }
                None => None,
            };

            if config.sequence_type == SequenceType::Nucleotide && strand == Strand::Reverse {
                sequence = reverse_complement(&sequence);
            }

            Ok(IndexedRecord::new(sequence, strand, region))
        }
        Mode::Scan => {
            if config.sequence_type == SequenceType::Peptide && config.il_equal {
                sequence = collapse_isoleucine(&sequence);
            }
            Ok(IndexedRecord::new(sequence, Strand::None, None))
        }
    }
}
