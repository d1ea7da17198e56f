//! Configuration types for path-indexer
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of records per bulk load
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Batch size limits accepted on the command line
pub const MIN_BATCH_SIZE: usize = 5_000;
pub const MAX_BATCH_SIZE: usize = 50_000;

/// Emit a progress event at most once per this many processed files
pub const DEFAULT_REPORT_EVERY: u64 = 500;

/// Minimum wall-clock gap between throttled log lines
pub const DEFAULT_LOG_INTERVAL_MS: u64 = 250;

/// Store command timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Counting pass liveness milestone
pub const DEFAULT_COUNT_MILESTONE: u64 = 1_000_000;

/// Capacity of the worker -> consumer event queue
pub const DEFAULT_EVENT_CAPACITY: usize = 10_000;

/// Lines retained by the consumer's log view
pub const DEFAULT_LOG_CAPACITY: usize = 5_000;

/// Crawl a directory tree into a deduplicated SQLite file index
#[derive(Parser, Debug, Clone)]
#[command(
    name = "path-indexer",
    version,
    about = "Crawl a directory tree into a deduplicated SQLite file index",
    long_about = "Walks a directory tree depth-first and bulk-loads every file path into a \
                  SQLite table keyed by full path.\n\n\
                  A counting pass runs first so progress can be shown as a percentage. \
                  Re-running over the same tree never creates duplicate rows.",
    after_help = "EXAMPLES:\n    \
        path-indexer /srv/share -o paths.db\n    \
        path-indexer ~/Documents -b 20000 --log-file index.log\n    \
        path-indexer /mnt/archive --no-count -q\n    \
        path-indexer stats paths.db --top 10",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct CliArgs {
    /// Folder to index
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Subcommand (stats)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// SQLite database file
    #[arg(short = 'o', long = "database", default_value = "paths.db", value_name = "FILE")]
    pub database: PathBuf,

    /// Records per bulk load
    #[arg(short = 'b', long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "NUM")]
    pub batch_size: usize,

    /// Report progress every N processed files
    #[arg(long, default_value_t = DEFAULT_REPORT_EVERY, value_name = "NUM")]
    pub report_every: u64,

    /// Minimum milliseconds between "Processed" log lines
    #[arg(long, default_value_t = DEFAULT_LOG_INTERVAL_MS, value_name = "MS")]
    pub log_interval_ms: u64,

    /// Store command timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECS")]
    pub timeout: u64,

    /// Skip the counting pass (progress shown as a spinner)
    #[arg(long)]
    pub no_count: bool,

    /// Write the retained log lines to this file when the run ends
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Quiet mode - suppress progress and log output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose diagnostics on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Show what an index database contains
    Stats {
        /// SQLite database file
        #[arg(value_name = "DB")]
        db: PathBuf,

        /// Number of extensions to list
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,
    },
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Store connection target
    pub db_path: PathBuf,

    /// Records per bulk load
    pub batch_size: usize,

    /// Progress event cadence, in processed files
    pub report_every: u64,

    /// Minimum gap between throttled log lines
    pub log_interval: Duration,

    /// Busy timeout applied to every store command
    pub command_timeout: Duration,

    /// Counting pass logs a milestone every this many files
    pub count_milestone: u64,

    /// Run the counting pass before indexing
    pub count_first: bool,

    /// Event queue capacity
    pub event_capacity: usize,

    /// Consumer log view capacity
    pub log_capacity: usize,
}

impl IndexConfig {
    /// Defaults for a given database
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            report_every: DEFAULT_REPORT_EVERY,
            log_interval: Duration::from_millis(DEFAULT_LOG_INTERVAL_MS),
            command_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            count_milestone: DEFAULT_COUNT_MILESTONE,
            count_first: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        if args.batch_size < MIN_BATCH_SIZE || args.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                size: args.batch_size,
                min: MIN_BATCH_SIZE,
                max: MAX_BATCH_SIZE,
            });
        }

        if args.report_every == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }

        if args.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if let Some(parent) = args.database.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidOutputPath {
                    path: args.database.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        Ok(Self {
            batch_size: args.batch_size,
            report_every: args.report_every,
            log_interval: Duration::from_millis(args.log_interval_ms),
            command_timeout: Duration::from_secs(args.timeout),
            count_first: !args.no_count,
            ..Self::new(args.database.clone())
        })
    }
}

/// Check that `root` names an existing directory
pub fn validate_root(root: &Path) -> Result<(), ConfigError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".into(),
        }),
        Err(e) => Err(ConfigError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["path-indexer", "/tmp"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = IndexConfig::from_args(&args(&[])).unwrap();
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.report_every, 500);
        assert_eq!(config.log_interval, Duration::from_millis(250));
        assert_eq!(config.command_timeout, Duration::from_secs(600));
        assert!(config.count_first);
        assert_eq!(config.db_path, PathBuf::from("paths.db"));
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(IndexConfig::from_args(&args(&["-b", "5000"])).is_ok());
        assert!(IndexConfig::from_args(&args(&["-b", "50000"])).is_ok());

        let err = IndexConfig::from_args(&args(&["-b", "4999"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBatchSize { size: 4999, .. }));
        assert!(IndexConfig::from_args(&args(&["-b", "50001"])).is_err());
    }

    #[test]
    fn test_zero_report_interval_rejected() {
        let err = IndexConfig::from_args(&args(&["--report-every", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReportInterval));
    }

    #[test]
    fn test_no_count_flag() {
        let config = IndexConfig::from_args(&args(&["--no-count"])).unwrap();
        assert!(!config.count_first);
    }

    #[test]
    fn test_missing_output_parent() {
        let err = IndexConfig::from_args(&args(&["-o", "/nonexistent/dir/paths.db"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOutputPath { .. }));
    }

    #[test]
    fn test_database_flag_forms() {
        let short = CliArgs::try_parse_from(["path-indexer", "/tmp", "-o", "a.db"]).unwrap();
        assert_eq!(short.database, PathBuf::from("a.db"));

        let long = CliArgs::try_parse_from(["path-indexer", "/tmp", "--database", "b.db"]).unwrap();
        assert_eq!(long.database, PathBuf::from("b.db"));

        assert!(CliArgs::try_parse_from(["path-indexer", "/tmp", "-d", "c.db"]).is_err());
    }

    #[test]
    fn test_stats_subcommand() {
        let parsed = CliArgs::parse_from(["path-indexer", "stats", "paths.db", "-n", "5"]);
        assert!(parsed.root.is_none());
        match parsed.command {
            Some(Command::Stats { db, top }) => {
                assert_eq!(db, PathBuf::from("paths.db"));
                assert_eq!(top, 5);
            }
            None => panic!("expected stats subcommand"),
        }
    }

    #[test]
    fn test_validate_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_root(dir.path()).is_ok());

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(validate_root(&file).is_err());
        assert!(validate_root(&dir.path().join("missing")).is_err());
    }
}
