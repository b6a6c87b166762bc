//! Join of the indexed records with the merged location table, at raw-line,
//! unique-sequence and location-tuple granularity.
use fxhash::{FxHashMap, FxHashSet};
use log::warn;

use readscan_core::models::{IndexedRecord, LocationTable, Strand};
use readscan_core::utils::rphm;

///
/// Reads supporting one unique sequence. `num_locations` is only filled in
/// scan mode.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCount {
    pub sequence: String,
    pub read_count: u64,
    pub num_locations: usize,
}

///
/// Reads supporting one (sequence, location, strand) tuple.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleCount {
    pub sequence: String,
    pub location: String,
    pub strand: Strand,
    pub read_count: u64,
}

/// Counters keyed in first-seen order.
#[derive(Debug)]
struct OrderedCounts<K, V> {
    positions: FxHashMap<K, usize>,
    values: Vec<V>,
}

impl<K: std::hash::Hash + Eq, V> Default for OrderedCounts<K, V> {
    fn default() -> Self {
        OrderedCounts {
            positions: FxHashMap::default(),
            values: Vec::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq, V> OrderedCounts<K, V> {
    fn entry(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let next = self.values.len();
        let position = *self.positions.entry(key).or_insert(next);
        if position == next {
            self.values.push(init());
        }
        &mut self.values[position]
    }

    fn into_values(self) -> Vec<V> {
        self.values
    }
}

///
/// Scan-mode aggregation result.
///
#[derive(Debug, Default)]
pub struct ScanAggregate {
    /// raw line + annotation, one per (raw line, location)
    pub annotated: Vec<String>,
    /// raw lines of records without any location
    pub not_found: Vec<String>,
    pub sequences: Vec<SequenceCount>,
    pub decoys: Vec<SequenceCount>,
    pub tuples: Vec<TupleCount>,
    /// sequences aggregated more than once
    pub duplicates: usize,
}

///
/// Target-mode aggregation result.
///
#[derive(Debug, Default)]
pub struct TargetAggregate {
    /// raw line + `ReadCount`, `RPHM`
    pub annotated: Vec<String>,
    pub sequences: Vec<SequenceCount>,
}

///
/// Walk the records against the merged table, filling each record's read count.
///
/// A sequence must be aggregated by exactly one record; seeing it again is
/// reported as a severe warning and its contribution is counted again.
///
pub fn aggregate_scan(
    records: &mut [IndexedRecord],
    table: &LocationTable,
    library_size: u64,
) -> ScanAggregate {
    let mut aggregate = ScanAggregate::default();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut sequences: OrderedCounts<String, SequenceCount> = OrderedCounts::default();
    let mut decoys: OrderedCounts<String, SequenceCount> = OrderedCounts::default();
    let mut tuples: OrderedCounts<(String, String, Strand), TupleCount> = OrderedCounts::default();

    for record in records.iter_mut() {
        if !seen.insert(record.sequence.clone()) {
            warn!(
                "Severe: {} is aggregated more than once; its reads are counted again",
                record.sequence
            );
            aggregate.duplicates += 1;
        }

        let locations = table.get_locations(&record.sequence);
        record.read_count = locations.iter().map(|info| info.read_count).sum();

        if locations.is_empty() {
            aggregate.not_found.extend(record.raw_lines.iter().cloned());
        }
        let annotations: Vec<String> = locations
            .iter()
            .map(|info| info.annotation(library_size))
            .collect();
        for line in &record.raw_lines {
            for annotation in &annotations {
                aggregate.annotated.push(format!("{}\t{}", line, annotation));
            }
        }

        let distinct_locations: FxHashSet<&str> =
            locations.iter().map(|info| info.location.as_str()).collect();
        let summary = if record.is_decoy {
            &mut decoys
        } else {
            &mut sequences
        };
        let count = summary.entry(record.sequence.clone(), || SequenceCount {
            sequence: record.sequence.clone(),
            read_count: 0,
            num_locations: 0,
        });
        count.read_count += record.read_count;
        count.num_locations += distinct_locations.len();

        if record.is_decoy {
            continue;
        }
        for info in &locations {
            let key = (record.sequence.clone(), info.location.clone(), info.strand);
            let tuple = tuples.entry(key, || TupleCount {
                sequence: record.sequence.clone(),
                location: info.location.clone(),
                strand: info.strand,
                read_count: 0,
            });
            tuple.read_count += info.read_count;
        }
    }

    aggregate.sequences = sequences.into_values();
    aggregate.decoys = decoys.into_values();
    aggregate.tuples = tuples.into_values();
    aggregate
}

///
/// Target records already carry their read counts; spread them over the raw
/// lines and sum them per unique sequence.
///
pub fn aggregate_target(records: &[IndexedRecord], library_size: u64) -> TargetAggregate {
    let mut aggregate = TargetAggregate::default();
    let mut sequences: OrderedCounts<String, SequenceCount> = OrderedCounts::default();

    for record in records.iter().filter(|record| !record.is_decoy) {
        for line in &record.raw_lines {
            aggregate.annotated.push(format!(
                "{}\t{}\t{}",
                line,
                record.read_count,
                rphm(record.read_count, library_size)
            ));
        }

        let count = sequences.entry(record.sequence.clone(), || SequenceCount {
            sequence: record.sequence.clone(),
            read_count: 0,
            num_locations: 0,
        });
        count.read_count += record.read_count;
    }

    aggregate.sequences = sequences.into_values();
    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use readscan_core::models::{GenomicRegion, LocationInformation};

    fn tuple(query: &str, location: &str, strand: Strand, reads: u64) -> LocationInformation {
        LocationInformation {
            query: query.to_string(),
            obs_nucleotide: "ATGGCC".to_string(),
            obs_peptide: query.to_string(),
            location: location.to_string(),
            strand,
            mutations: vec![],
            ref_nucleotide: "ATGGCC".to_string(),
            read_count: reads,
        }
    }

    fn record(sequence: &str, lines: &[&str]) -> IndexedRecord {
        let mut record = IndexedRecord::new(sequence.to_string(), Strand::None, None);
        record.raw_lines = lines.iter().map(|line| line.to_string()).collect();
        record
    }

    #[fixture]
    fn table() -> LocationTable {
        let mut table = LocationTable::new();
        table.put_location(tuple("MA", "chr1:100-105", Strand::Forward, 5));
        table.put_location(tuple("AM", "chr2:100-105", Strand::Reverse, 2));
        table
    }

    #[rstest]
    fn test_scan_aggregate_views(table: LocationTable) {
        let mut records = vec![
            record("MA", &["a\tMA", "c\tMA"]),
            record("KK", &["b\tKK"]),
            record("MA", &[]).to_decoy(),
        ];

        let aggregate = aggregate_scan(&mut records, &table, 100);

        assert_eq!(aggregate.annotated.len(), 2);
        assert!(aggregate.annotated[0].starts_with("a\tMA\tchr1:100-105\t-\t+\t"));
        assert!(aggregate.annotated[1].starts_with("c\tMA\tchr1:100-105"));
        assert_eq!(aggregate.not_found, vec!["b\tKK".to_string()]);

        assert_eq!(
            aggregate.sequences,
            vec![
                SequenceCount {
                    sequence: "MA".to_string(),
                    read_count: 5,
                    num_locations: 1
                },
                SequenceCount {
                    sequence: "KK".to_string(),
                    read_count: 0,
                    num_locations: 0
                },
            ]
        );
        assert_eq!(
            aggregate.decoys,
            vec![SequenceCount {
                sequence: "AM".to_string(),
                read_count: 2,
                num_locations: 1
            }]
        );
        assert_eq!(
            aggregate.tuples,
            vec![TupleCount {
                sequence: "MA".to_string(),
                location: "chr1:100-105".to_string(),
                strand: Strand::Forward,
                read_count: 5
            }]
        );
        assert_eq!(records[0].read_count, 5);
        assert_eq!(aggregate.duplicates, 0);
    }

    #[rstest]
    fn test_annotated_lines_keep_each_input_row_together() {
        let mut table = LocationTable::new();
        table.put_location(tuple("MA", "chr2:1-6", Strand::Forward, 1));
        table.put_location(tuple("MA", "chr1:1-6", Strand::Forward, 1));
        let mut records = vec![record("MA", &["a", "b"])];

        let aggregate = aggregate_scan(&mut records, &table, 100);

        let order: Vec<String> = aggregate
            .annotated
            .iter()
            .map(|line| line.split('\t').take(2).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(
            order,
            vec![
                "a chr1:1-6".to_string(),
                "a chr2:1-6".to_string(),
                "b chr1:1-6".to_string(),
                "b chr2:1-6".to_string(),
            ]
        );
    }

    #[rstest]
    fn test_duplicate_sequence_is_reported_and_counted(table: LocationTable) {
        let mut records = vec![record("MA", &["a\tMA"]), record("MA", &["b\tMA"])];

        let aggregate = aggregate_scan(&mut records, &table, 100);

        assert_eq!(aggregate.duplicates, 1);
        assert_eq!(aggregate.sequences.len(), 1);
        assert_eq!(aggregate.sequences[0].read_count, 10);
        assert_eq!(aggregate.tuples[0].read_count, 10);
    }

    #[rstest]
    fn test_target_aggregate_sums_per_sequence() {
        let region = GenomicRegion {
            chr: "chr1".to_string(),
            start: 10,
            end: 20,
        };
        let mut first = IndexedRecord::new("MAK".to_string(), Strand::Forward, Some(region.clone()));
        first.raw_lines = vec!["r1".to_string(), "r2".to_string()];
        first.read_count = 3;
        let mut second = IndexedRecord::new("MAK".to_string(), Strand::Reverse, Some(region));
        second.raw_lines = vec!["r3".to_string()];
        second.read_count = 4;
        let mut unplaced = IndexedRecord::new("KK".to_string(), Strand::None, None);
        unplaced.raw_lines = vec!["r4".to_string()];

        let aggregate = aggregate_target(&[first, second, unplaced], 0);

        assert_eq!(
            aggregate.annotated,
            vec![
                "r1\t3\t0".to_string(),
                "r2\t3\t0".to_string(),
                "r3\t4\t0".to_string(),
                "r4\t0\t0".to_string(),
            ]
        );
        assert_eq!(aggregate.sequences[0].read_count, 7);
        assert_eq!(aggregate.sequences[1].read_count, 0);
    }
}
