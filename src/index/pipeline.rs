//! Two-pass indexing run
//!
//! Count first so the consumer can show a percentage, then walk again and
//! feed decomposed records through the batch accumulator into the loader.

use super::batch::BatchAccumulator;
use super::record::FileRecord;
use crate::cancel::CancellationToken;
use crate::config::IndexConfig;
use crate::db::{BatchStore, BulkLoader};
use crate::error::Result;
use crate::progress::{format_number, ProgressReporter};
use crate::walker::{count_files, DirReader, FsReader, PathEnumerator};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a run that reached the end of its traversal
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Absolute root that was indexed
    pub root: PathBuf,

    /// Files seen by the main pass
    pub processed: u64,

    /// Files seen by the counting pass (0 = unknown)
    pub total: u64,

    /// Rows added to the durable table
    pub inserted: u64,

    /// Batches flushed
    pub batches: u64,

    /// Directories that could not be listed plus single entries that
    /// could not be read
    pub skipped_nodes: u64,

    /// Wall time of the run
    pub duration: Duration,

    /// False when the run was cancelled
    pub completed: bool,
}

/// Orchestrates one indexing run on the calling thread
pub struct Pipeline<R = FsReader> {
    config: IndexConfig,
    reader: R,
    reporter: ProgressReporter,
    cancel: CancellationToken,
}

impl Pipeline<FsReader> {
    pub fn new(config: IndexConfig, reporter: ProgressReporter, cancel: CancellationToken) -> Self {
        Self::with_reader(config, FsReader, reporter, cancel)
    }
}

impl<R: DirReader> Pipeline<R> {
    pub fn with_reader(
        config: IndexConfig,
        reader: R,
        reporter: ProgressReporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            reader,
            reporter,
            cancel,
        }
    }

    /// Index every file under `root` into `loader`
    ///
    /// Traversal problems are logged and skipped. Only store failures end
    /// the run early; rows from batches merged before the failure stay.
    pub fn run<S: BatchStore>(&self, root: &Path, loader: &mut BulkLoader<S>) -> Result<RunSummary> {
        let started = Instant::now();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        info!(root = %root.display(), batch_size = self.config.batch_size, "Starting index run");

        self.reporter.log("Ensuring table exists in database...");
        loader.ensure_schema()?;

        let total = if self.config.count_first {
            self.reporter.log("Counting files (to show percentage)...");
            count_files(
                &root,
                &self.reader,
                &self.reporter,
                &self.cancel,
                self.config.count_milestone,
            )
        } else {
            0
        };

        if total == 0 {
            self.reporter
                .log("Total files unknown or zero. Progress will be indeterminate.");
        } else {
            self.reporter
                .log(format!("Total files detected: {}", format_number(total)));
        }
        self.reporter.set_total(total);

        loader.prepare_staging()?;

        let mut walk = PathEnumerator::with_reader(
            &root,
            &self.reader,
            self.reporter.clone(),
            self.cancel.clone(),
        );
        let mut batch = BatchAccumulator::new(self.config.batch_size);
        let mut processed = 0u64;

        for path in walk.by_ref() {
            processed += 1;
            if let Some(record) = FileRecord::from_path(&path) {
                if batch.push(record) {
                    loader.load(batch.records())?;
                    batch.clear();
                }
            }
            self.reporter.record_processed(processed);
        }

        // Remainder goes out even when cancelled, so persisted rows match
        // the processed count
        if !batch.is_empty() {
            loader.load(batch.records())?;
            batch.clear();
        }

        let completed = !self.cancel.is_cancelled();
        let duration = started.elapsed();
        let stats = loader.stats();
        let skipped_nodes = walk.dirs_skipped() + walk.entries_skipped();

        if completed {
            self.reporter.log(format!(
                "Done. Processed {} files in {:.1}s.",
                format_number(processed),
                duration.as_secs_f64()
            ));
        } else {
            self.reporter.log(format!(
                "Cancelled. Processed {} files before stopping.",
                format_number(processed)
            ));
        }

        debug!(
            processed,
            inserted = stats.inserted,
            batches = stats.batches,
            skipped = skipped_nodes,
            dropped_events = self.reporter.dropped_events(),
            "Index run finished"
        );

        Ok(RunSummary {
            root,
            processed,
            total,
            inserted: stats.inserted,
            batches: stats.batches,
            skipped_nodes,
            duration,
            completed,
        })
    }
}
