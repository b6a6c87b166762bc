use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuilder};

use readscan_core::errors::{ReadScanError, Result};
use readscan_core::memory::used_memory_mb;

use crate::task::{Task, TaskEnv, TaskReport};

///
/// Outcome of one pool run: the reports in execution-priority order and the
/// peak memory seen before, during and after the run.
///
#[derive(Debug, Default)]
pub struct PoolRun {
    pub reports: Vec<TaskReport>,
    pub peak_memory_mb: u64,
}

///
/// A fixed-size pool of workers draining a priority-sorted task list.
///
pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
    show_progress: bool,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ReadScanError::Config(format!("cannot start worker pool: {}", e)))?;

        Ok(WorkerPool {
            pool,
            threads,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message(label.to_string());
        bar
    }

    ///
    /// Run every task to completion and return their reports.
    ///
    /// Tasks are sorted once by priority; workers then take them strictly in that
    /// order. The call returns only after all workers have joined. A failing task
    /// stops workers from taking new tasks and fails the whole run.
    ///
    /// # Arguments
    /// - label: what the run does, shown next to the progress bar
    /// - tasks: the batch to run
    /// - env: inputs shared by all tasks
    ///
    pub fn run(&self, label: &str, mut tasks: Vec<Task>, env: &TaskEnv) -> Result<PoolRun> {
        tasks.sort_by_key(|task| task.priority());

        let memory_before = used_memory_mb();
        info!("{}: {} tasks on {} workers", label, tasks.len(), self.threads);

        let bar = self.progress_bar(tasks.len(), label);
        let next = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        let (sender, receiver) = mpsc::channel::<(usize, Result<TaskReport>)>();

        let tasks_ref = &tasks;
        let (next, failed, bar_ref) = (&next, &failed, &bar);

        self.pool.scope(|scope| {
            for _ in 0..self.threads {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    while !failed.load(Ordering::Acquire) {
                        let i = next.fetch_add(1, Ordering::AcqRel);
                        let Some(task) = tasks_ref.get(i) else {
                            break;
                        };

                        debug!("Running task {}", task);
                        let result = task.execute(env);
                        if result.is_err() {
                            failed.store(true, Ordering::Release);
                        }
                        bar_ref.inc(1);

                        if sender.send((i, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(sender);
        bar.finish_and_clear();

        let mut slots: Vec<Option<TaskReport>> = (0..tasks.len()).map(|_| None).collect();
        let mut first_failure: Option<(usize, ReadScanError)> = None;
        for (i, result) in receiver {
            match result {
                Ok(report) => slots[i] = Some(report),
                Err(e) => {
                    if first_failure.as_ref().is_none_or(|(j, _)| i < *j) {
                        first_failure = Some((i, e));
                    }
                }
            }
        }

        if let Some((i, e)) = first_failure {
            return Err(ReadScanError::TaskFailed {
                task: tasks[i].to_string(),
                reason: e.to_string(),
            });
        }

        let reports: Vec<TaskReport> = slots.into_iter().flatten().collect();
        let peak_memory_mb = reports
            .iter()
            .map(|report| report.peak_memory_mb)
            .chain([memory_before, used_memory_mb()])
            .max()
            .unwrap_or(0);

        Ok(PoolRun {
            reports,
            peak_memory_mb,
        })
    }
}
