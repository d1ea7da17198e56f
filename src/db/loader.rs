//! Staged, idempotent bulk loading
//!
//! Each batch goes through the same four steps against a [`BatchStore`]:
//!
//! ```text
//!   batch ──▶ staging (unconstrained) ──▶ merge: insert where full_path absent
//!                                    └──▶ clear staging for the next batch
//! ```
//!
//! Re-running over the same tree only re-stages rows; the merge skips every
//! path the durable table already holds, so row counts never grow from a
//! re-index. Any store failure is returned to the caller and ends the run.

use super::store::BatchStore;
use crate::error::StoreResult;
use crate::index::FileRecord;
use tracing::debug;

/// Totals across every batch loaded so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-empty batches flushed
    pub batches: u64,
    /// Records staged
    pub staged: u64,
    /// Rows actually added to the durable table
    pub inserted: u64,
}

/// Drives a [`BatchStore`] through bootstrap and per-batch merges
pub struct BulkLoader<S> {
    store: S,
    bootstrapped: bool,
    staging_ready: bool,
    stats: LoadStats,
}

impl<S: BatchStore> BulkLoader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            bootstrapped: false,
            staging_ready: false,
            stats: LoadStats::default(),
        }
    }

    /// Create the durable table once per loader
    pub fn ensure_schema(&mut self) -> StoreResult<()> {
        if !self.bootstrapped {
            self.store.create_table_if_absent()?;
            self.bootstrapped = true;
        }
        Ok(())
    }

    /// Recreate an empty staging area
    pub fn prepare_staging(&mut self) -> StoreResult<()> {
        self.store.reset_staging()?;
        self.staging_ready = true;
        Ok(())
    }

    /// Merge one batch; returns rows inserted. Empty batches never reach
    /// the store.
    pub fn load(&mut self, batch: &[FileRecord]) -> StoreResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        self.ensure_schema()?;
        if !self.staging_ready {
            self.prepare_staging()?;
        }

        self.store.insert_staging(batch)?;
        let inserted = self.store.merge_staging()?;
        self.store.clear_staging()?;

        self.stats.batches += 1;
        self.stats.staged += batch.len() as u64;
        self.stats.inserted += inserted;
        debug!(
            batch = self.stats.batches,
            staged = batch.len(),
            inserted,
            "Batch merged"
        );

        Ok(inserted)
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
