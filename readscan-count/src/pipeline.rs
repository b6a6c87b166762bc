use std::path::Path;
use std::time::Instant;

use log::info;

use readscan_core::config::{Mode, ScanConfig, Strandedness};
use readscan_core::errors::Result;
use readscan_core::matcher::{AlignmentMatcher, MatchContext, QuerySet};
use readscan_core::memory::used_memory_mb;
use readscan_core::models::LocationTable;

use crate::aggregate::{aggregate_scan, aggregate_target};
use crate::index::RecordIndex;
use crate::merge::merge_reports;
use crate::output::{OutputPaths, write_scan_outputs, write_target_outputs};
use crate::scheduler::WorkerPool;
use crate::strand::classify_strandedness;
use crate::task::{TaskEnv, plan_main_batch, plan_strand_detection};

///
/// What a finished run reports back.
///
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub library_size: u64,
    pub strandedness: Strandedness,
    pub records: usize,
    pub decoys: usize,
    pub elapsed_secs: f64,
    pub peak_memory_mb: u64,
}

///
/// Counting result before aggregation. Target records already carry their
/// read counts.
///
#[derive(Debug)]
pub struct CountOutcome {
    pub table: LocationTable,
    pub library_size: u64,
    pub strandedness: Strandedness,
    pub peak_memory_mb: u64,
}

///
/// Resolve strandedness, run the main batch and merge its reports.
///
/// # Arguments
/// - config: a validated, normalized configuration
/// - index: the record index; target counts are written into its records
/// - matcher: the alignment source
/// - pool: the worker pool to run on
///
pub fn count_reads(
    config: &ScanConfig,
    index: &mut RecordIndex,
    matcher: &dyn AlignmentMatcher,
    pool: &WorkerPool,
) -> Result<CountOutcome> {
    let mut peak_memory_mb = used_memory_mb();
    let partitions = matcher.partitions(config.scan_window)?;
    info!("Alignment source split into {} partitions", partitions.len());

    let strandedness = match config.strandedness {
        Strandedness::Auto => {
            let queries = QuerySet::default();
            let env = TaskEnv {
                matcher,
                records: &[],
                queries: &queries,
                context: MatchContext::new(config, Strandedness::Auto),
                sample_size: config.strand_sample_size,
            };
            let run = pool.run(
                "Estimating strandedness",
                plan_strand_detection(&partitions),
                &env,
            )?;
            peak_memory_mb = peak_memory_mb.max(run.peak_memory_mb);

            let merged = merge_reports(run.reports);
            classify_strandedness(&merged.tally, config.strand_dominance_ratio)?
        }
        strandedness => strandedness,
    };

    let queries = match config.mode {
        Mode::Scan => QuerySet::from_records(&index.records),
        Mode::Target => QuerySet::default(),
    };
    info!("Searching for {} query sequences", queries.len());

    let env = TaskEnv {
        matcher,
        records: &index.records,
        queries: &queries,
        context: MatchContext::new(config, strandedness),
        sample_size: config.strand_sample_size,
    };
    let tasks = plan_main_batch(config, &partitions, index.records.len());
    let run = pool.run("Counting reads", tasks, &env)?;
    peak_memory_mb = peak_memory_mb.max(run.peak_memory_mb);

    let merged = merge_reports(run.reports);
    let counted_reads = match config.mode {
        Mode::Scan => merged.processed_reads,
        Mode::Target => merged.library_reads,
    };
    let library_size = config.library_size.unwrap_or(counted_reads);
    for (i, reads) in merged.target_counts {
        index.records[i].read_count = reads;
    }

    Ok(CountOutcome {
        table: merged.table,
        library_size,
        strandedness,
        peak_memory_mb,
    })
}

///
/// Run readscan end to end: index the input table, count reads against the
/// alignment source and write every derived view next to `output_prefix`.
///
pub fn run_readscan(
    config: &ScanConfig,
    input: &Path,
    matcher: &dyn AlignmentMatcher,
    output_prefix: &Path,
) -> Result<RunSummary> {
    let start = Instant::now();

    config.validate()?;
    let config = config.normalized();
    info!("Running with\n{}", config);

    let mut index = RecordIndex::from_path(input, &config)?;
    let pool = WorkerPool::new(config.threads)?;
    let outcome = count_reads(&config, &mut index, matcher, &pool)?;

    let paths = OutputPaths::from_prefix(output_prefix);
    match config.mode {
        Mode::Scan => {
            let aggregate = aggregate_scan(&mut index.records, &outcome.table, outcome.library_size);
            info!(
                "{} of {} sequences found ({} input rows not found)",
                aggregate
                    .sequences
                    .iter()
                    .filter(|count| count.read_count > 0)
                    .count(),
                aggregate.sequences.len(),
                aggregate.not_found.len()
            );
            write_scan_outputs(
                &paths,
                &index.header,
                &aggregate,
                outcome.library_size,
                config.decoy,
            )?;
        }
        Mode::Target => {
            let aggregate = aggregate_target(&index.records, outcome.library_size);
            write_target_outputs(&paths, &index.header, &aggregate, outcome.library_size)?;
        }
    }

    let summary = RunSummary {
        library_size: outcome.library_size,
        strandedness: outcome.strandedness,
        records: index.num_real(),
        decoys: index.num_decoys(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        peak_memory_mb: outcome.peak_memory_mb.max(used_memory_mb()),
    };

    info!("Library size: {}", summary.library_size);
    info!("Elapsed time: {:.2} sec", summary.elapsed_secs);
    info!("Estimated peak memory: {} MB", summary.peak_memory_mb);

    Ok(summary)
}
