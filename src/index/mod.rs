//! Record decomposition, batching and the indexing pipeline

pub mod batch;
pub mod pipeline;
pub mod record;

pub use batch::BatchAccumulator;
pub use pipeline::{Pipeline, RunSummary};
pub use record::FileRecord;
