//! Terminal front end for index runs
//!
//! Renders [`IndexEvent`]s with indicatif: a percentage bar while the total
//! is known, a spinner otherwise. Log lines are printed above the bar and
//! retained in a bounded [`LogBuffer`].

use crate::index::RunSummary;
use crate::progress::{format_number, IndexEvent, LogLine, Progress};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Printed when Ctrl-C arrives; the run keeps what it found so far
pub const INTERRUPT_NOTICE: &str = "Interrupt received, saving files found so far and stopping...";

/// Most recent rendered log lines; the oldest line is evicted first
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BarMode {
    Percent,
    Spinner,
}

/// Consumer side of an index run
pub struct ConsoleView {
    bar: ProgressBar,
    mode: Option<BarMode>,
    log: LogBuffer,
    quiet: bool,
    summary: Option<RunSummary>,
    failure: Option<String>,
}

impl ConsoleView {
    pub fn new(log_capacity: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        Self {
            bar,
            mode: None,
            log: LogBuffer::new(log_capacity),
            quiet,
            summary: None,
            failure: None,
        }
    }

    /// Apply one event to the display
    pub fn apply(&mut self, event: IndexEvent) {
        match event {
            IndexEvent::Progress {
                progress,
                processed,
            } => self.show_progress(progress, processed),
            IndexEvent::Log(line) => self.push_line(&line),
            IndexEvent::Completed(summary) => {
                let message = if summary.completed {
                    "Index completed"
                } else {
                    "Index interrupted"
                };
                self.push_line(&LogLine::now(format!(
                    "Summary: {} processed, total count seen {}.",
                    summary.processed, summary.total
                )));
                self.bar.finish_with_message(message);
                self.summary = Some(summary);
            }
            IndexEvent::Failed(message) => {
                self.push_line(&LogLine::now(format!("Error: {}", message)));
                self.bar.abandon_with_message("Index failed");
                self.failure = Some(message);
            }
        }
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn show_progress(&mut self, progress: Progress, processed: u64) {
        match progress {
            Progress::Percent(pct) => {
                self.set_mode(BarMode::Percent);
                self.bar.set_position(u64::from(pct));
                self.bar
                    .set_message(format!("{} files", format_number(processed)));
            }
            Progress::Indeterminate => {
                self.set_mode(BarMode::Spinner);
                self.bar
                    .set_message(format!("{} files", format_number(processed)));
            }
        }
    }

    fn set_mode(&mut self, mode: BarMode) {
        if self.mode == Some(mode) {
            return;
        }
        self.mode = Some(mode);
        match mode {
            BarMode::Percent => {
                self.bar.disable_steady_tick();
                self.bar.set_length(100);
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏ "),
                );
            }
            BarMode::Spinner => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
                );
                self.bar.enable_steady_tick(Duration::from_millis(100));
            }
        }
    }

    fn push_line(&mut self, line: &LogLine) {
        let rendered = line.render();
        if !self.quiet {
            self.bar.println(&rendered);
        }
        self.log.push(rendered);
    }
}

/// Print a header at the start of a run
pub fn print_header(root: &Path, db_path: &Path, batch_size: usize) {
    println!();
    println!(
        "{} {}",
        style("path-indexer").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root.display());
    println!("  {} {}", style("Database:").bold(), db_path.display());
    println!("  {} {}", style("Batch size:").bold(), format_number(batch_size as u64));
    println!();
}

/// Print the outcome of a run
pub fn print_summary(summary: &RunSummary, db_path: &Path, db_size: Option<u64>) {
    let secs = summary.duration.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.processed as f64 / secs
    } else {
        0.0
    };

    println!();
    if summary.completed {
        println!("{}", style("Index Complete").green().bold());
    } else {
        println!("{}", style("Index Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Processed:").bold(), format_number(summary.processed));
    if summary.total > 0 {
        println!("  {} {}", style("Counted:").bold(), format_number(summary.total));
    }
    println!("  {} {}", style("New rows:").bold(), format_number(summary.inserted));
    println!("  {} {}", style("Batches:").bold(), format_number(summary.batches));
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        secs,
        rate
    );
    if summary.skipped_nodes > 0 {
        println!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(summary.skipped_nodes)
        );
    }
    match db_size {
        Some(size) => println!(
            "  {} {} ({})",
            style("Database:").bold(),
            db_path.display(),
            format_size(size, BINARY)
        ),
        None => println!("  {} {}", style("Database:").bold(), db_path.display()),
    }
    println!();
}

/// Print the contents of an index database
pub fn print_stats(
    db_path: &Path,
    rows: u64,
    extensions: &[(Option<String>, u64)],
    info: &[(&str, String)],
) {
    println!();
    println!("{} {}", style("Index:").cyan().bold(), db_path.display());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Files:").bold(), format_number(rows));

    if !extensions.is_empty() {
        println!();
        println!("  {}", style("Top extensions").bold());
        for (ext, count) in extensions {
            println!(
                "    {:<16} {:>12}",
                ext.as_deref().unwrap_or("(none)"),
                format_number(*count)
            );
        }
    }

    if !info.is_empty() {
        println!();
        println!("  {}", style("Last run").bold());
        for (key, value) in info {
            println!("    {:<16} {}", key, value);
        }
    }
    println!();
}
