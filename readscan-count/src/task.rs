use std::fmt::{self, Display};
use std::ops::Range;

use readscan_core::config::{Mode, ScanConfig};
use readscan_core::errors::Result;
use readscan_core::matcher::{AlignmentMatcher, MatchContext, Partition, QuerySet, StrandTally};
use readscan_core::memory::used_memory_mb;
use readscan_core::models::{IndexedRecord, LocationTable};

///
/// What a task does. The variant fixes the task's priority rank.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Count the usable reads of a partition.
    LibrarySize(Partition),
    /// Tally mate orientations of a partition.
    StrandDetection(Partition),
    /// Scan a partition for every query sequence.
    Scan(Partition),
    /// Count reads for a chunk of target records (indices into the record index).
    Target(Range<usize>),
}

///
/// A unit of scheduled work.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: usize,
    pub kind: TaskKind,
}

///
/// Shared, read-only inputs of a pool run.
///
pub struct TaskEnv<'a> {
    pub matcher: &'a dyn AlignmentMatcher,
    pub records: &'a [IndexedRecord],
    pub queries: &'a QuerySet,
    pub context: MatchContext,
    pub sample_size: u64,
}

///
/// Everything a task produced. Each task fills its own report; reports only
/// meet after the pool run has joined.
///
#[derive(Debug, Default, Clone)]
pub struct TaskReport {
    pub task_id: usize,
    pub processed_reads: u64,
    pub library_reads: u64,
    pub tally: StrandTally,
    pub table: LocationTable,
    /// (record index, supporting reads) for target tasks
    pub target_counts: Vec<(usize, u64)>,
    pub peak_memory_mb: u64,
}

impl Task {
    pub fn new(id: usize, kind: TaskKind) -> Self {
        Task { id, kind }
    }

    ///
    /// Priority rank, lower runs first: library size, then strand detection,
    /// then the unmapped scan, then all other work.
    ///
    pub fn priority(&self) -> u8 {
        match &self.kind {
            TaskKind::LibrarySize(_) => 0,
            TaskKind::StrandDetection(_) => 1,
            TaskKind::Scan(Partition::Unmapped) => 2,
            TaskKind::Scan(Partition::Region { .. }) | TaskKind::Target(_) => 3,
        }
    }

    pub fn execute(&self, env: &TaskEnv) -> Result<TaskReport> {
        let mut report = TaskReport {
            task_id: self.id,
            peak_memory_mb: used_memory_mb(),
            ..Default::default()
        };

        match &self.kind {
            TaskKind::LibrarySize(partition) => {
                report.library_reads = env.matcher.count_reads(partition, env.context.count)?;
                report.processed_reads = report.library_reads;
            }
            TaskKind::StrandDetection(partition) => {
                report.tally = env.matcher.tally_orientation(partition, env.sample_size)?;
                report.processed_reads = report.tally.total();
            }
            TaskKind::Scan(partition) => {
                report.processed_reads = env.matcher.scan_partition(
                    partition,
                    env.queries,
                    &env.context,
                    &mut report.table,
                )?;
            }
            TaskKind::Target(range) => {
                for i in range.clone() {
                    let reads = env.matcher.count_target(&env.records[i], &env.context)?;
                    report.processed_reads += reads;
                    report.target_counts.push((i, reads));
                }
            }
        }

        report.peak_memory_mb = report.peak_memory_mb.max(used_memory_mb());
        Ok(report)
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TaskKind::LibrarySize(partition) => write!(f, "#{} library size [{}]", self.id, partition),
            TaskKind::StrandDetection(partition) => {
                write!(f, "#{} strand detection [{}]", self.id, partition)
            }
            TaskKind::Scan(partition) => write!(f, "#{} scan [{}]", self.id, partition),
            TaskKind::Target(range) => write!(
                f,
                "#{} target [records {}..{}]",
                self.id, range.start, range.end
            ),
        }
    }
}

///
/// Records per target chunk: `records / (chunks_per_worker * threads) + 1`, so
/// every worker gets several chunks.
///
pub fn chunk_size(records: usize, threads: usize, chunks_per_worker: usize) -> usize {
    records / (chunks_per_worker * threads).max(1) + 1
}

///
/// Strand detection tasks, one per mapped partition.
///
pub fn plan_strand_detection(partitions: &[Partition]) -> Vec<Task> {
    partitions
        .iter()
        .filter(|partition| !partition.is_unmapped())
        .cloned()
        .enumerate()
        .map(|(id, partition)| Task::new(id, TaskKind::StrandDetection(partition)))
        .collect()
}

///
/// The main batch: scan tasks (one per partition), or target tasks (one per
/// record chunk) preceded by library-size tasks when the size isn't given.
///
/// Scan tasks visit every read of their partition anyway, so the scan-mode
/// library size comes from their processed reads.
///
pub fn plan_main_batch(config: &ScanConfig, partitions: &[Partition], num_records: usize) -> Vec<Task> {
    let mut kinds: Vec<TaskKind> = Vec::new();

    match config.mode {
        Mode::Scan => kinds.extend(partitions.iter().cloned().map(TaskKind::Scan)),
        Mode::Target => {
            if config.library_size.is_none() {
                kinds.extend(partitions.iter().cloned().map(TaskKind::LibrarySize));
            }
            let size = chunk_size(num_records, config.threads, config.chunks_per_worker);
            let mut start = 0;
            while start < num_records {
                let end = (start + size).min(num_records);
                kinds.push(TaskKind::Target(start..end));
                start = end;
            }
        }
    }

    kinds
        .into_iter()
        .enumerate()
        .map(|(id, kind)| Task::new(id, kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn region(chr: &str) -> Partition {
        Partition::Region {
            chr: chr.to_string(),
            start: 1,
            end: 100,
        }
    }

    #[fixture]
    fn partitions() -> Vec<Partition> {
        vec![region("chr1"), region("chr2"), Partition::Unmapped]
    }

    #[rstest]
    #[case(0, 4, 10, 1)]
    #[case(39, 4, 10, 1)]
    #[case(40, 4, 10, 2)]
    #[case(1000, 4, 10, 26)]
    #[case(1000, 1, 10, 101)]
    fn test_chunk_size(
        #[case] records: usize,
        #[case] threads: usize,
        #[case] per_worker: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(chunk_size(records, threads, per_worker), expected);
    }

    #[rstest]
    fn test_priority_ranks() {
        let library = Task::new(0, TaskKind::LibrarySize(region("chr1")));
        let strand = Task::new(1, TaskKind::StrandDetection(region("chr1")));
        let unmapped = Task::new(2, TaskKind::Scan(Partition::Unmapped));
        let mapped = Task::new(3, TaskKind::Scan(region("chr1")));
        let target = Task::new(4, TaskKind::Target(0..10));

        assert!(library.priority() < strand.priority());
        assert!(strand.priority() < unmapped.priority());
        assert!(unmapped.priority() < mapped.priority());
        assert_eq!(mapped.priority(), target.priority());
    }

    #[rstest]
    fn test_strand_detection_skips_unmapped(partitions: Vec<Partition>) {
        let tasks = plan_strand_detection(&partitions);
        assert_eq!(tasks.len(), 2);
        assert!(
            tasks
                .iter()
                .all(|task| matches!(task.kind, TaskKind::StrandDetection(_)))
        );
    }

    #[rstest]
    fn test_scan_batch_counts_library_while_scanning(partitions: Vec<Partition>) {
        let config = ScanConfig {
            mode: Mode::Scan,
            library_size: None,
            ..Default::default()
        };
        let tasks = plan_main_batch(&config, &partitions, 5);

        assert_eq!(tasks.len(), 3);
        assert!(
            tasks
                .iter()
                .all(|task| matches!(task.kind, TaskKind::Scan(_)))
        );
    }

    #[rstest]
    fn test_target_batch_with_library_size(partitions: Vec<Partition>) {
        let config = ScanConfig {
            mode: Mode::Target,
            library_size: None,
            threads: 1,
            chunks_per_worker: 1,
            ..Default::default()
        };
        let tasks = plan_main_batch(&config, &partitions, 5);

        let library = tasks
            .iter()
            .filter(|task| matches!(task.kind, TaskKind::LibrarySize(_)))
            .count();
        assert_eq!(library, 3);
        assert_eq!(tasks.len(), 4);
    }

    #[rstest]
    fn test_scan_batch_with_known_library_size(partitions: Vec<Partition>) {
        let config = ScanConfig {
            mode: Mode::Scan,
            library_size: Some(1000),
            ..Default::default()
        };
        let tasks = plan_main_batch(&config, &partitions, 5);
        assert_eq!(tasks.len(), 3);
    }

    #[rstest]
    fn test_target_batch_covers_every_record_once(partitions: Vec<Partition>) {
        let config = ScanConfig {
            mode: Mode::Target,
            threads: 2,
            chunks_per_worker: 2,
            library_size: Some(1000),
            ..Default::default()
        };
        let tasks = plan_main_batch(&config, &partitions, 10);

        let mut covered = Vec::new();
        for task in &tasks {
            match &task.kind {
                TaskKind::Target(range) => covered.extend(range.clone()),
                other => panic!("unexpected task {:?}", other),
            }
        }
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
        assert_eq!(tasks.len(), 4);
    }
}
