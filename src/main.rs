//! path-indexer - Directory Tree File Indexer
//!
//! Entry point for the CLI application.

use anyhow::{bail, Context, Result};
use clap::Parser;
use path_indexer::config::{CliArgs, Command, IndexConfig, DEFAULT_TIMEOUT_SECS};
use path_indexer::console::{
    print_header, print_stats, print_summary, ConsoleView, INTERRUPT_NOTICE,
};
use path_indexer::db::SqliteStore;
use path_indexer::Indexer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    match &args.command {
        Some(Command::Stats { db, top }) => run_stats(db, *top),
        None => run_index(&args),
    }
}

fn run_index(args: &CliArgs) -> Result<()> {
    let Some(root) = args.root.as_deref() else {
        bail!("A folder to index is required (see --help)");
    };

    let config = IndexConfig::from_args(args).context("Invalid configuration")?;

    if !args.quiet {
        print_header(root, &config.db_path, config.batch_size);
    }

    let indexer = Indexer::new(config.clone());
    let run = indexer.start(root).context("Failed to start index run")?;

    let cancel = run.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\n{}", INTERRUPT_NOTICE);
        cancel.cancel();
    })
    .context("Failed to set signal handler")?;

    let mut view = ConsoleView::new(config.log_capacity, args.quiet);
    for event in run.events().iter() {
        view.apply(event);
    }

    let result = run.wait();

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        view.log()
            .write_to(BufWriter::new(file))
            .with_context(|| format!("Failed to write log file {}", path.display()))?;
        info!(path = %path.display(), lines = view.log().len(), "Log written");
    }

    let summary = result.context("Index run failed")?;

    if !args.quiet {
        let db_size = std::fs::metadata(&config.db_path).ok().map(|m| m.len());
        print_summary(&summary, &config.db_path, db_size);
    }

    if !summary.completed {
        warn!("Index run was interrupted before completion");
    }

    Ok(())
}

fn run_stats(db: &Path, top: usize) -> Result<()> {
    if !db.exists() {
        bail!("Database not found: {}", db.display());
    }

    let store = SqliteStore::open(db, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .with_context(|| format!("Failed to open {}", db.display()))?;
    let rows = store.row_count().context("Failed to count rows")?;
    let extensions = store
        .extension_counts(top)
        .context("Failed to read extensions")?;
    let info = store.index_info().context("Failed to read run metadata")?;

    print_stats(db, rows, &extensions, &info);
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("path_indexer=debug,warn")
        } else {
            EnvFilter::new("error")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
