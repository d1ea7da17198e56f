//! path-indexer - Directory Tree File Indexer
//!
//! Crawls a directory tree and records every file path in a SQLite table
//! keyed by full path. Runs are idempotent: indexing the same tree again
//! adds only paths that are new.
//!
//! # Features
//!
//! - **Fault-tolerant traversal**: Unreadable directories are logged and
//!   skipped; one bad node never ends the run.
//!
//! - **Two-pass progress**: A counting pass seeds a percentage; when it
//!   fails or finds nothing the display falls back to a spinner.
//!
//! - **Staged bulk loading**: Records are flushed in batches through a
//!   temporary staging table and merged with insert-if-absent semantics.
//!
//! - **Responsive consumers**: Progress and log lines travel over a bounded
//!   channel with per-N-files and per-interval throttles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Consumer (CLI view)                         │
//! │     ConsoleView ◀── IndexEvent ◀── bounded channel              │
//! │     Ctrl-C ──▶ CancellationToken                                │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ Indexer::start
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Worker thread ("indexer")                     │
//! │                                                                 │
//! │   count_files ──▶ total ──▶ ProgressReporter::set_total         │
//! │                                                                 │
//! │   PathEnumerator ──▶ FileRecord ──▶ BatchAccumulator            │
//! │                                          │ full / remainder     │
//! │                                          ▼                      │
//! │                                     BulkLoader                  │
//! │                          stage → merge if absent → clear        │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────┐
//!                    │   SQLite DB      │
//!                    │   (paths.db)     │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Index a share
//! path-indexer /srv/share -o paths.db
//!
//! # Inspect the result
//! path-indexer stats paths.db
//! sqlite3 paths.db "SELECT extension, COUNT(*) FROM file_index GROUP BY 1"
//! ```

pub mod cancel;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod index;
pub mod indexer;
pub mod progress;
pub mod walker;

pub use cancel::CancellationToken;
pub use config::{CliArgs, Command, IndexConfig};
pub use error::{IndexerError, Result};
pub use index::{FileRecord, RunSummary};
pub use indexer::{IndexRun, Indexer};
pub use progress::{IndexEvent, Progress, ProgressReporter};
