use std::collections::hash_map::Entry;

use fxhash::FxHashMap;

use crate::models::{LocationInformation, LocationKey};

///
/// LocationTable struct, query sequence -> tuple key -> location tuple.
///
/// Every task fills a private table while it scans; the global table is built
/// afterwards by absorbing the task tables one after another. Accumulation only
/// ever sums `read_count`, so the merged result does not depend on task order.
///
#[derive(Debug, Default, Clone)]
pub struct LocationTable {
    table: FxHashMap<String, FxHashMap<LocationKey, LocationInformation>>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Insert a tuple, summing its read count into an existing entry with the
    /// same key. Every other field of an existing entry stays as first written.
    ///
    pub fn put_location(&mut self, info: LocationInformation) {
        let tuples = self.table.entry(info.query.clone()).or_default();
        match tuples.entry(info.key()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().read_count += info.read_count;
            }
            Entry::Vacant(entry) => {
                entry.insert(info);
            }
        }
    }

    ///
    /// All tuples recorded for a query sequence, ordered by location, strand and
    /// observed nucleotide sequence. Empty when the sequence was never observed.
    ///
    pub fn get_locations(&self, sequence: &str) -> Vec<&LocationInformation> {
        let mut locations: Vec<(&LocationKey, &LocationInformation)> = self
            .table
            .get(sequence)
            .map(|tuples| tuples.iter().collect())
            .unwrap_or_default();
        locations.sort_by(|a, b| a.0.cmp(b.0));
        locations.into_iter().map(|(_, info)| info).collect()
    }

    /// Sum of read counts over all tuples of a query sequence.
    pub fn read_count(&self, sequence: &str) -> u64 {
        self.table
            .get(sequence)
            .map(|tuples| tuples.values().map(|info| info.read_count).sum())
            .unwrap_or(0)
    }

    /// Number of distinct query sequences with at least one tuple.
    pub fn num_sequences(&self) -> usize {
        self.table.len()
    }

    /// Number of tuples over all query sequences.
    pub fn len(&self) -> usize {
        self.table.values().map(|tuples| tuples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Consume the table, yielding every tuple it holds.
    pub fn into_locations(self) -> impl Iterator<Item = LocationInformation> {
        self.table
            .into_values()
            .flat_map(|tuples| tuples.into_values())
    }

    /// Accumulate all tuples of another table into this one.
    pub fn absorb(&mut self, other: LocationTable) {
        for info in other.into_locations() {
            self.put_location(info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use crate::models::Strand;

    fn tuple(query: &str, location: &str, strand: Strand, reads: u64) -> LocationInformation {
        LocationInformation {
            query: query.to_string(),
            obs_nucleotide: format!("{}_NT", query),
            obs_peptide: query.to_string(),
            location: location.to_string(),
            strand,
            mutations: vec![],
            ref_nucleotide: format!("{}_NT", query),
            read_count: reads,
        }
    }

    #[fixture]
    fn table_a() -> LocationTable {
        let mut table = LocationTable::new();
        table.put_location(tuple("PEP1", "chr1:10-30", Strand::Forward, 3));
        table.put_location(tuple("PEP2", "chr2:50-70", Strand::Reverse, 1));
        table
    }

    #[fixture]
    fn table_b() -> LocationTable {
        let mut table = LocationTable::new();
        table.put_location(tuple("PEP1", "chr1:10-30", Strand::Forward, 4));
        table.put_location(tuple("PEP1", "chr5:1-21", Strand::Forward, 2));
        table
    }

    fn counts(table: &LocationTable, sequence: &str) -> Vec<(String, u64)> {
        table
            .get_locations(sequence)
            .into_iter()
            .map(|info| (info.location.clone(), info.read_count))
            .collect()
    }

    #[rstest]
    fn test_put_location_sums_same_tuple() {
        let mut table = LocationTable::new();
        table.put_location(tuple("PEP1", "chr1:10-30", Strand::Forward, 1));
        table.put_location(tuple("PEP1", "chr1:10-30", Strand::Forward, 1));
        table.put_location(tuple("PEP1", "chr1:10-30", Strand::Reverse, 1));

        assert_eq!(table.len(), 2);
        assert_eq!(table.read_count("PEP1"), 3);
    }

    #[rstest]
    fn test_put_location_keeps_first_written_fields() {
        let mut table = LocationTable::new();
        table.put_location(tuple("PEP1", "chr1:10-30", Strand::Forward, 1));

        let mut later = tuple("PEP1", "chr1:10-30", Strand::Forward, 2);
        later.mutations = vec!["chr1:12:A>G".to_string()];
        table.put_location(later);

        let locations = table.get_locations("PEP1");
        assert_eq!(locations.len(), 1);
        assert!(locations[0].mutations.is_empty());
        assert_eq!(locations[0].read_count, 3);
    }

    #[rstest]
    fn test_get_locations_unknown_sequence_is_empty() {
        let table = LocationTable::new();
        assert!(table.get_locations("NOPE").is_empty());
        assert_eq!(table.read_count("NOPE"), 0);
    }

    #[rstest]
    fn test_absorb_is_commutative(table_a: LocationTable, table_b: LocationTable) {
        let mut ab = LocationTable::new();
        ab.absorb(table_a.clone());
        ab.absorb(table_b.clone());

        let mut ba = LocationTable::new();
        ba.absorb(table_b);
        ba.absorb(table_a);

        assert_eq!(counts(&ab, "PEP1"), counts(&ba, "PEP1"));
        assert_eq!(counts(&ab, "PEP2"), counts(&ba, "PEP2"));
        assert_eq!(
            counts(&ab, "PEP1"),
            vec![
                ("chr1:10-30".to_string(), 7),
                ("chr5:1-21".to_string(), 2)
            ]
        );
    }

    #[rstest]
    fn test_absorb_loses_nothing(table_a: LocationTable, table_b: LocationTable) {
        let expected = table_a.read_count("PEP1")
            + table_b.read_count("PEP1")
            + table_a.read_count("PEP2")
            + table_b.read_count("PEP2");

        let mut merged = LocationTable::new();
        merged.absorb(table_a);
        merged.absorb(table_b);

        assert_eq!(merged.read_count("PEP1") + merged.read_count("PEP2"), expected);
        assert_eq!(merged.num_sequences(), 2);
        assert_eq!(merged.len(), 3);
    }
}
