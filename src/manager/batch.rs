//! Directory-level batch execution
//!
//! Files are processed independently on a small pool of scoped threads.
//! One file's failure never stops the others, and results are keyed by file
//! name so the report does not depend on completion order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{VaultError, VaultResult};
use crate::storage::FileFilter;

/// Cancellation token for cooperative cancellation between files
///
/// Cancelling stops new files from being picked up; files already in flight
/// run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Options shared by all directory operations
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Which files to pick up
    pub filter: FileFilter,
    /// Worker threads; defaults to the number of CPUs
    pub workers: Option<usize>,
    /// Stops scheduling new files when cancelled
    pub cancel: CancellationToken,
}

impl BatchOptions {
    /// Only pick up files with this extension
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Outcome of a directory operation
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Per-file results, keyed by file name
    pub succeeded: BTreeMap<String, T>,
    /// Per-file errors, keyed by file name
    pub failed: BTreeMap<String, VaultError>,
    /// Files never started because the batch was cancelled
    pub skipped: Vec<String>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: BTreeMap::new(),
            failed: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    /// Number of files the batch knew about
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// True when every file was processed and none failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Collapse into the successes, or `PartialBatchFailure` if anything failed
    pub fn into_result(self) -> VaultResult<BTreeMap<String, T>> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(VaultError::PartialBatchFailure {
                succeeded: self.succeeded.len(),
                failed: self.failed.len(),
            })
        }
    }
}

/// Run `op` over `files` and collect a report
pub(crate) fn run_batch<T, F>(
    operation: &'static str,
    files: Vec<(String, PathBuf)>,
    options: &BatchOptions,
    op: F,
) -> BatchReport<T>
where
    T: Send,
    F: Fn(&Path) -> VaultResult<T> + Sync,
{
    let workers = options
        .workers
        .unwrap_or_else(num_cpus::get)
        .clamp(1, files.len().max(1));

    let next = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<(usize, VaultResult<T>)>> = Mutex::new(Vec::with_capacity(files.len()));

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                if options.cancel.is_cancelled() {
                    break;
                }
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some((_, path)) = files.get(index) else {
                    break;
                };
                let outcome = op(path);
                outcomes
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push((index, outcome));
            });
        }
    });

    let outcomes = outcomes
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let mut processed = vec![false; files.len()];
    let mut report = BatchReport::default();

    for (index, outcome) in outcomes {
        processed[index] = true;
        let name = files[index].0.clone();
        match outcome {
            Ok(value) => {
                tracing::debug!(operation, file = %name, "file processed");
                report.succeeded.insert(name, value);
            }
            Err(e) => {
                tracing::warn!(
                    operation,
                    file = %name,
                    category = e.category(),
                    error = %e,
                    "file failed"
                );
                report.failed.insert(name, e);
            }
        }
    }

    report.skipped = files
        .iter()
        .zip(processed)
        .filter(|(_, done)| !done)
        .map(|((name, _), _)| name.clone())
        .collect();

    tracing::info!(
        operation,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "batch finished"
    );

    report
}
