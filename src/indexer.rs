//! Background indexing runs
//!
//! The indexer owns the single-run guard and spawns one worker thread per
//! run. The worker opens its own store connection, drives the pipeline and
//! reports through the event channel; the caller keeps only the receiving
//! end, the cancellation token and the join handle.

use crate::cancel::CancellationToken;
use crate::config::{validate_root, IndexConfig};
use crate::db::{BulkLoader, SqliteStore};
use crate::error::{IndexerError, Result};
use crate::index::{Pipeline, RunSummary};
use crate::progress::{IndexEvent, ProgressReporter};
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Starts indexing runs, at most one at a time
pub struct Indexer {
    config: IndexConfig,
    running: Arc<AtomicBool>,
}

impl Indexer {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// True while a worker spawned by this indexer is alive
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Validate `root` and spawn the worker thread
    pub fn start(&self, root: &Path) -> Result<IndexRun> {
        validate_root(root)?;
        let root = std::path::absolute(root)?;

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(IndexerError::AlreadyRunning);
        }
        let guard = RunGuard(Arc::clone(&self.running));

        let (tx, rx) = bounded(self.config.event_capacity.max(1));
        let reporter = ProgressReporter::new(tx, &self.config);
        let cancel = CancellationToken::new();
        let config = self.config.clone();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("indexer".into())
            .spawn(move || {
                let _guard = guard;
                run_worker(config, root, reporter, worker_cancel)
            })?;

        Ok(IndexRun {
            events: rx,
            cancel,
            handle,
        })
    }
}

/// Clears the running flag when the worker exits, panics included
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn run_worker(
    config: IndexConfig,
    root: PathBuf,
    reporter: ProgressReporter,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let started_at = Utc::now();
    info!(root = %root.display(), db = %config.db_path.display(), "Index worker started");

    let outcome = SqliteStore::open(&config.db_path, config.command_timeout)
        .map_err(IndexerError::from)
        .map(|store| {
            let mut loader = BulkLoader::new(store);
            let pipeline = Pipeline::new(config, reporter.clone(), cancel);
            let result = pipeline.run(&root, &mut loader);
            (loader.into_inner(), result)
        });

    match outcome {
        Ok((store, Ok(summary))) => {
            let status = if summary.completed { "completed" } else { "interrupted" };
            if let Err(e) = store.record_run(&root, started_at, status, Some(&summary)) {
                warn!(error = %e, "Failed to record run metadata");
            }
            reporter.complete(summary.clone());
            Ok(summary)
        }
        Ok((store, Err(e))) => {
            if let Err(meta) = store.record_run(&root, started_at, "failed", None) {
                warn!(error = %meta, "Failed to record run metadata");
            }
            error!(error = %e, "Index run failed");
            reporter.fail(&e);
            Err(e)
        }
        Err(e) => {
            error!(error = %e, "Index run failed");
            reporter.fail(&e);
            Err(e)
        }
    }
}

/// Handle on a running index job
pub struct IndexRun {
    events: Receiver<IndexEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<RunSummary>>,
}

impl IndexRun {
    /// Event stream; ends once the worker has exited
    pub fn events(&self) -> &Receiver<IndexEvent> {
        &self.events
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask the worker to stop at its next traversal step
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join the worker and return its outcome
    ///
    /// Undrained events are discarded first so a worker blocked on the
    /// terminal event can finish.
    pub fn wait(self) -> Result<RunSummary> {
        let IndexRun { events, handle, .. } = self;
        drop(events);
        match handle.join() {
            Ok(result) => result,
            Err(payload) => Err(IndexerError::WorkerPanicked(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs/old")).unwrap();
        fs::write(dir.path().join("readme.md"), "x").unwrap();
        fs::write(dir.path().join("docs/a.txt"), "x").unwrap();
        fs::write(dir.path().join("docs/old/b.txt"), "x").unwrap();
        dir
    }

    #[test]
    fn test_run_to_completion() {
        let root = tree();
        let out = TempDir::new().unwrap();
        let indexer = Indexer::new(IndexConfig::new(out.path().join("paths.db")));

        let run = indexer.start(root.path()).unwrap();
        let events: Vec<IndexEvent> = run.events().iter().collect();
        let summary = run.wait().unwrap();

        assert!(summary.completed);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.inserted, 3);
        assert!(matches!(events.last(), Some(IndexEvent::Completed(_))));
        assert!(!indexer.is_running());

        let store = SqliteStore::open(&out.path().join("paths.db"), indexer.config().command_timeout)
            .unwrap();
        assert_eq!(store.row_count().unwrap(), 3);
        let info = store.index_info().unwrap();
        assert!(info.iter().any(|(k, v)| *k == "status" && v == "completed"));
    }

    #[test]
    fn test_rejects_missing_root() {
        let out = TempDir::new().unwrap();
        let indexer = Indexer::new(IndexConfig::new(out.path().join("paths.db")));
        let err = indexer.start(&out.path().join("nope")).err().unwrap();
        assert!(matches!(
            err,
            IndexerError::Config(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_single_run_at_a_time() {
        let root = tree();
        let out = TempDir::new().unwrap();
        let indexer = Indexer::new(IndexConfig::new(out.path().join("paths.db")));

        indexer.running.store(true, Ordering::Release);
        let err = indexer.start(root.path()).err().unwrap();
        assert!(matches!(err, IndexerError::AlreadyRunning));

        indexer.running.store(false, Ordering::Release);
        let run = indexer.start(root.path()).unwrap();
        run.wait().unwrap();
        assert!(!indexer.is_running());
    }

    #[test]
    fn test_open_failure_reported() {
        let root = tree();
        let indexer = Indexer::new(IndexConfig::new(root.path().join("missing/dir/paths.db")));

        let run = indexer.start(root.path()).unwrap();
        let events: Vec<IndexEvent> = run.events().iter().collect();
        let err = run.wait().unwrap_err();

        assert!(matches!(err, IndexerError::Store(_)));
        assert!(matches!(events.last(), Some(IndexEvent::Failed(_))));
    }

    #[test]
    fn test_tiny_queue_still_ends_with_completed() {
        let root = tree();
        let out = TempDir::new().unwrap();
        let mut config = IndexConfig::new(out.path().join("paths.db"));
        config.event_capacity = 1;
        config.report_every = 1;
        let indexer = Indexer::new(config);

        let run = indexer.start(root.path()).unwrap();
        // Let the worker overflow the queue before anyone reads it
        thread::sleep(std::time::Duration::from_millis(100));

        let events: Vec<IndexEvent> = run.events().iter().collect();
        let summary = run.wait().unwrap();
        assert!(summary.completed);
        assert!(matches!(events.last(), Some(IndexEvent::Completed(s)) if s.processed == 3));
    }

    #[test]
    fn test_wait_without_draining() {
        let root = tree();
        let out = TempDir::new().unwrap();
        let mut config = IndexConfig::new(out.path().join("paths.db"));
        config.event_capacity = 1;
        let indexer = Indexer::new(config);

        let run = indexer.start(root.path()).unwrap();
        let summary = run.wait().unwrap();
        assert_eq!(summary.processed, 3);
        assert!(!indexer.is_running());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
