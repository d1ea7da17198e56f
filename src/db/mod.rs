//! Durable storage for the file index
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Pipeline (worker thread)               │
//! │  - fills a BatchAccumulator                         │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ &[FileRecord]
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                   BulkLoader                        │
//! │  - bootstrap once                                   │
//! │  - stage → merge (insert if absent) → clear         │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ BatchStore
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │     SqliteStore (one connection per run)            │
//! │  file_index · temp.stage_file_index · index_info    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod loader;
pub mod schema;
pub mod store;

pub use loader::{BulkLoader, LoadStats};
pub use schema::{create_database, create_staging, get_index_info, keys, set_index_info};
pub use store::{BatchStore, FileStatus, IndexedFile, SqliteStore};
