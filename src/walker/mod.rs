//! Filesystem traversal
//!
//! ```text
//!            ┌──────────────────────────┐
//!            │      PathEnumerator      │
//!            │  - explicit dir stack    │
//!            │  - one listing per dir   │
//!            │  - bad dirs or entries   │
//!            │    logged and skipped    │
//!            └────────────┬─────────────┘
//!                         │ file paths (lazy)
//!         ┌───────────────┴───────────────┐
//!         ▼                               ▼
//!  ┌─────────────┐                 ┌─────────────┐
//!  │   Counter   │                 │  Pipeline   │
//!  │  (pass 1)   │                 │  (pass 2)   │
//!  └─────────────┘                 └─────────────┘
//! ```

pub mod counter;
pub mod enumerator;

pub use counter::count_files;
pub use enumerator::{DirReader, Entry, FsReader, Node, NodeKind, PathEnumerator};
