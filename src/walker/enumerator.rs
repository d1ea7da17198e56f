//! Iterative, error-tolerant directory walker
//!
//! `PathEnumerator` keeps an explicit stack of directories still to visit
//! instead of recursing, so tree depth never touches the call stack. Each
//! directory is listed once: subdirectories go onto the stack, files are
//! buffered and handed out one at a time. Order is depth-first but otherwise
//! unspecified.
//!
//! A directory that cannot be listed (permission denied, name too long,
//! I/O error) contributes zero entries. A single entry that cannot be read
//! is dropped on its own while its siblings are still walked. Either way the
//! failure is logged through the reporter and the walk carries on.

use crate::cancel::CancellationToken;
use crate::error::TraversalError;
use crate::progress::ProgressReporter;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a directory entry is, as far as the walk cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    File,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub path: PathBuf,
    pub kind: NodeKind,
}

impl Node {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Dir,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::File,
        }
    }
}

/// One listed child, or the reason it could not be read
pub type Entry = Result<Node, TraversalError>;

/// Lists the immediate children of one directory
///
/// The outer error means the directory itself could not be opened. Per-entry
/// failures come back inline so the readable siblings survive.
pub trait DirReader {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>>;
}

impl<T: DirReader + ?Sized> DirReader for &T {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        (**self).list(dir)
    }
}

/// `std::fs` backed reader
///
/// Symbolic links are never descended. A link whose target is a directory
/// is skipped; every other link, dangling ones included, counts as a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl DirReader for FsReader {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let mut nodes = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    nodes.push(Err(TraversalError::from_io(dir, &e)));
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    nodes.push(Err(TraversalError::from_io(&path, &e)));
                    continue;
                }
            };

            let kind = if file_type.is_dir() {
                NodeKind::Dir
            } else if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(meta) if meta.is_dir() => {
                        debug!(path = %path.display(), "Skipping directory symlink");
                        continue;
                    }
                    _ => NodeKind::File,
                }
            } else {
                NodeKind::File
            };

            nodes.push(Ok(Node { path, kind }));
        }
        Ok(nodes)
    }
}

/// Lazy sequence of file paths under a root
pub struct PathEnumerator<R = FsReader> {
    reader: R,
    pending: Vec<PathBuf>,
    ready: VecDeque<PathBuf>,
    reporter: ProgressReporter,
    cancel: CancellationToken,
    dirs_listed: u64,
    dirs_skipped: u64,
    entries_skipped: u64,
}

impl PathEnumerator<FsReader> {
    pub fn new(root: &Path, reporter: ProgressReporter, cancel: CancellationToken) -> Self {
        Self::with_reader(root, FsReader, reporter, cancel)
    }
}

impl<R: DirReader> PathEnumerator<R> {
    pub fn with_reader(
        root: &Path,
        reader: R,
        reporter: ProgressReporter,
        cancel: CancellationToken,
    ) -> Self {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            reader,
            pending: vec![root],
            ready: VecDeque::new(),
            reporter,
            cancel,
            dirs_listed: 0,
            dirs_skipped: 0,
            entries_skipped: 0,
        }
    }

    /// Directories listed successfully so far
    pub fn dirs_listed(&self) -> u64 {
        self.dirs_listed
    }

    /// Directories whose listing failed so far
    pub fn dirs_skipped(&self) -> u64 {
        self.dirs_skipped
    }

    /// Single entries that could not be read inside listed directories
    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped
    }

    fn expand(&mut self, dir: PathBuf) {
        match self.reader.list(&dir) {
            Ok(entries) => {
                self.dirs_listed += 1;
                for entry in entries {
                    match entry {
                        Ok(Node {
                            path,
                            kind: NodeKind::Dir,
                        }) => self.pending.push(path),
                        Ok(Node {
                            path,
                            kind: NodeKind::File,
                        }) => self.ready.push_back(path),
                        Err(err) => {
                            self.entries_skipped += 1;
                            self.reporter.warn(err.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                self.dirs_skipped += 1;
                let err = TraversalError::from_io(&dir, &e);
                self.reporter.warn(err.to_string());
            }
        }
    }
}

impl<R: DirReader> Iterator for PathEnumerator<R> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            if let Some(path) = self.ready.pop_front() {
                return Some(path);
            }
            let dir = self.pending.pop()?;
            self.expand(dir);
        }
    }
}
