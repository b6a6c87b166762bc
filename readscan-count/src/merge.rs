use log::debug;

use readscan_core::matcher::StrandTally;
use readscan_core::models::LocationTable;

use crate::task::TaskReport;

///
/// Union of the private task tables into one global table. Runs on one thread
/// after the pool has joined; the result doesn't depend on report order.
///
pub fn merge_tables<I>(tables: I) -> LocationTable
where
    I: IntoIterator<Item = LocationTable>,
{
    let mut global = LocationTable::new();
    for table in tables {
        global.absorb(table);
    }
    debug!(
        "Merged location table holds {} tuples for {} sequences",
        global.len(),
        global.num_sequences()
    );
    global
}

///
/// The merged outcome of a main-batch pool run.
///
#[derive(Debug, Default)]
pub struct MergedReports {
    pub table: LocationTable,
    pub library_reads: u64,
    pub tally: StrandTally,
    /// (record index, supporting reads), one entry per target record
    pub target_counts: Vec<(usize, u64)>,
    pub processed_reads: u64,
}

pub fn merge_reports(reports: Vec<TaskReport>) -> MergedReports {
    let mut tables = Vec::with_capacity(reports.len());
    let mut merged = MergedReports::default();

    for report in reports {
        merged.library_reads += report.library_reads;
        merged.tally += report.tally;
        merged.processed_reads += report.processed_reads;
        merged.target_counts.extend(report.target_counts);
        tables.push(report.table);
    }
    merged.table = merge_tables(tables);

    merged
}
