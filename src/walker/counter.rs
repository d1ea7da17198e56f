//! Counting pass
//!
//! Walks the tree once, ahead of indexing, purely to seed the percentage
//! denominator. Anything that goes wrong here degrades progress to
//! indeterminate mode; it never fails the run.

use super::enumerator::{DirReader, PathEnumerator};
use crate::cancel::CancellationToken;
use crate::progress::{format_number, ProgressReporter};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::warn;

/// Count the files under `root`; 0 means "unknown total"
///
/// Unreadable directories are reported to `tracing` only, since the main
/// pass will hit and report the same directories. A milestone line goes to
/// the reporter every `milestone` files so long counts show liveness.
pub fn count_files<R: DirReader>(
    root: &Path,
    reader: R,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
    milestone: u64,
) -> u64 {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let walk =
            PathEnumerator::with_reader(root, reader, ProgressReporter::disconnected(), cancel.clone());
        let mut count = 0u64;
        for _ in walk {
            count += 1;
            if milestone > 0 && count % milestone == 0 {
                reporter.log(format!("Counted {} files so far...", format_number(count)));
            }
        }
        count
    }));

    match outcome {
        // A partial count would make the percentage overshoot
        Ok(_) if cancel.is_cancelled() => 0,
        Ok(count) => count,
        Err(_) => {
            warn!(root = %root.display(), "Counting pass aborted");
            reporter.warn("Counting error: counting pass aborted");
            0
        }
    }
}
