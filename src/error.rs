//! Error types for path-indexer
//!
//! This module defines the error hierarchy that covers:
//! - Store errors (SQLite bootstrap, staging, merge)
//! - Configuration and CLI errors
//! - Per-directory traversal errors
//!
//! Only store and configuration errors are fatal. Traversal errors are
//! caught where they happen and turned into log events, so they never
//! travel through `IndexerError`.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for an indexing run
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Store errors (fatal for the current run)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors outside of traversal (thread spawn, log file, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A run was requested while another one is still active
    #[error("An indexing run is already in progress")]
    AlreadyRunning,

    /// The worker thread panicked
    #[error("Indexing worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open the database
    #[error("Failed to open database at '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema bootstrap error
    #[error("Database schema error: {0}")]
    Schema(#[source] rusqlite::Error),

    /// Populating the staging table failed
    #[error("Staging failed: {0}")]
    Staging(#[source] rusqlite::Error),

    /// The insert-if-absent merge failed
    #[error("Merge failed: {0}")]
    Merge(#[source] rusqlite::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Root folder missing or not a directory
    #[error("Invalid root folder '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Invalid batch size
    #[error("Invalid batch size {size}: must be between {min} and {max}")]
    InvalidBatchSize { size: usize, min: usize, max: usize },

    /// Report cadence of zero
    #[error("Invalid report interval: progress must be reported at least every file")]
    InvalidReportInterval,

    /// Zero command timeout
    #[error("Invalid timeout: must be at least one second")]
    InvalidTimeout,

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// A directory that could not be listed during traversal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    #[error("Access denied: {path} ({reason})")]
    AccessDenied { path: PathBuf, reason: String },

    #[error("Path too long: {path} ({reason})")]
    NameTooLong { path: PathBuf, reason: String },

    #[error("Not found: {path} ({reason})")]
    NotFound { path: PathBuf, reason: String },

    #[error("IO error: {path} ({reason})")]
    Io { path: PathBuf, reason: String },
}

impl TraversalError {
    /// Classify an I/O error raised while listing `path`
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        let path = path.to_path_buf();
        let reason = err.to_string();
        match err.kind() {
            io::ErrorKind::PermissionDenied => TraversalError::AccessDenied { path, reason },
            io::ErrorKind::InvalidFilename => TraversalError::NameTooLong { path, reason },
            io::ErrorKind::NotFound => TraversalError::NotFound { path, reason },
            _ => TraversalError::Io { path, reason },
        }
    }

    /// The directory that failed
    pub fn path(&self) -> &Path {
        match self {
            TraversalError::AccessDenied { path, .. }
            | TraversalError::NameTooLong { path, .. }
            | TraversalError::NotFound { path, .. }
            | TraversalError::Io { path, .. } => path,
        }
    }
}

/// Result type alias for IndexerError
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Result type alias for StoreError
pub type StoreResult<T> = std::result::Result<T, StoreError>;
