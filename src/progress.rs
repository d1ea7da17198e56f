//! Progress and log events for an indexing run
//!
//! The worker never touches consumer state. It emits immutable
//! [`IndexEvent`]s into a bounded channel and the consumer (the CLI view,
//! or any other front end) owns whatever it renders from them.
//!
//! Two throttles keep the consumer responsive under millions of files:
//! - progress events go out at most once per `report_every` files
//! - "Processed: N" log lines go out at most once per `log_interval`
//!
//! Progress and log sends never block. Events that do not fit in the queue
//! are dropped and counted, so consumers must treat them as the latest known
//! state. The single terminal event (completed or failed) waits for room
//! instead, so a draining consumer always sees how the run ended.

use crate::config::IndexConfig;
use crate::index::RunSummary;
use chrono::{DateTime, Local};
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Completion indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Percent complete, 0..=100
    Percent(u8),
    /// Total unknown; render a busy indicator
    Indeterminate,
}

impl Progress {
    /// `min(100, processed * 100 / total)`, or indeterminate when total is 0
    pub fn compute(processed: u64, total: u64) -> Self {
        if total == 0 {
            return Progress::Indeterminate;
        }
        let pct = (processed as u128 * 100 / total as u128).min(100);
        Progress::Percent(pct as u8)
    }
}

/// A timestamped human-readable log line
#[derive(Debug, Clone)]
pub struct LogLine {
    pub at: DateTime<Local>,
    pub message: String,
}

impl LogLine {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            message: message.into(),
        }
    }

    /// `HH:MM:SS - message`
    pub fn render(&self) -> String {
        format!("{} - {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Events delivered from the worker to the consumer
#[derive(Debug, Clone)]
pub enum IndexEvent {
    Progress { progress: Progress, processed: u64 },
    Log(LogLine),
    Completed(RunSummary),
    Failed(String),
}

/// Minimum-interval limiter
///
/// Holds the last emit time as nanoseconds since `origin` (plus one, so
/// zero means "never emitted") and advances it with compare-and-swap.
#[derive(Debug)]
pub struct RateLimiter {
    origin: Instant,
    interval: Duration,
    last: AtomicU64,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval,
            last: AtomicU64::new(0),
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Returns true and records `now` if at least `interval` has passed
    /// since the last successful acquire.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let stamp = now.saturating_duration_since(self.origin).as_nanos() as u64 + 1;
        let interval = self.interval.as_nanos() as u64;
        let mut prev = self.last.load(Ordering::Acquire);
        loop {
            if prev != 0 && stamp.saturating_sub(prev) < interval {
                return false;
            }
            match self
                .last
                .compare_exchange_weak(prev, stamp, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[derive(Debug)]
struct ReporterState {
    report_every: u64,
    total: AtomicU64,
    last_reported: AtomicU64,
    dropped: AtomicU64,
    log_limiter: RateLimiter,
}

/// Throttled emitter used by the worker
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: Option<Sender<IndexEvent>>,
    state: Arc<ReporterState>,
}

impl ProgressReporter {
    pub fn new(sender: Sender<IndexEvent>, config: &IndexConfig) -> Self {
        Self::build(Some(sender), config.report_every, config.log_interval)
    }

    /// A reporter with no consumer; events only reach `tracing`
    pub fn disconnected() -> Self {
        Self::build(
            None,
            crate::config::DEFAULT_REPORT_EVERY,
            Duration::from_millis(crate::config::DEFAULT_LOG_INTERVAL_MS),
        )
    }

    fn build(sender: Option<Sender<IndexEvent>>, report_every: u64, log_interval: Duration) -> Self {
        Self {
            sender,
            state: Arc::new(ReporterState {
                report_every: report_every.max(1),
                total: AtomicU64::new(0),
                last_reported: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                log_limiter: RateLimiter::new(log_interval),
            }),
        }
    }

    /// Seed the percentage denominator (0 = unknown) and announce the mode
    pub fn set_total(&self, total: u64) {
        self.state.total.store(total, Ordering::Relaxed);
        self.state.last_reported.store(0, Ordering::Relaxed);
        self.emit(IndexEvent::Progress {
            progress: Progress::compute(0, total),
            processed: 0,
        });
    }

    pub fn total(&self) -> u64 {
        self.state.total.load(Ordering::Relaxed)
    }

    /// Record the running processed count; emits at most once per
    /// `report_every` files, with a rate-limited log line alongside.
    pub fn record_processed(&self, processed: u64) {
        let last = self.state.last_reported.load(Ordering::Relaxed);
        if processed.saturating_sub(last) < self.state.report_every {
            return;
        }
        if self
            .state
            .last_reported
            .compare_exchange(last, processed, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        self.emit(IndexEvent::Progress {
            progress: Progress::compute(processed, self.total()),
            processed,
        });
        self.log_throttled(format!("Processed: {}", format_number(processed)));
    }

    /// Unthrottled log line
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.emit(IndexEvent::Log(LogLine::now(message)));
    }

    /// Unthrottled log line for a suppressed error
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.emit(IndexEvent::Log(LogLine::now(message)));
    }

    /// Log line subject to the wall-clock limiter; returns whether it went out
    pub fn log_throttled(&self, message: impl Into<String>) -> bool {
        if !self.state.log_limiter.try_acquire() {
            return false;
        }
        let message = message.into();
        debug!("{}", message);
        self.emit(IndexEvent::Log(LogLine::now(message)));
        true
    }

    /// Terminal events wait for queue space instead of being dropped
    pub fn complete(&self, summary: RunSummary) {
        self.emit_terminal(IndexEvent::Completed(summary));
    }

    pub fn fail(&self, error: &dyn std::error::Error) {
        self.emit_terminal(IndexEvent::Failed(error.to_string()));
    }

    /// Events discarded because the queue was full
    pub fn dropped_events(&self) -> u64 {
        self.state.dropped.load(Ordering::Relaxed)
    }

    fn emit(&self, event: IndexEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.state.dropped.fetch_add(1, Ordering::Relaxed);
            }
            // Consumer went away; keep indexing
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Blocks while the queue is full; returns once the consumer drops its
    /// receiver, so a consumer that stops listening cannot wedge the worker
    fn emit_terminal(&self, event: IndexEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(event).is_err() {
            debug!("Consumer gone before the terminal event");
        }
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}
