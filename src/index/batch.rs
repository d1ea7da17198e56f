//! Fixed-size record buffer between the walk and the bulk loader

use super::record::FileRecord;

/// Buffers records until `capacity` is reached
///
/// The caller flushes `records()` when `push` reports the batch full and
/// calls `clear` only after the flush succeeded.
#[derive(Debug)]
pub struct BatchAccumulator {
    records: Vec<FileRecord>,
    capacity: usize,
}

impl BatchAccumulator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record; returns true when the batch is ready to flush
    pub fn push(&mut self, record: FileRecord) -> bool {
        self.records.push(record);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
