//! Integration tests for path-indexer
//!
//! Real runs go against scratch trees from tempfile; unreadable directories
//! are simulated with a fake reader so results do not depend on privileges.

use clap::Parser;
use path_indexer::config::{CliArgs, Command, IndexConfig};
use path_indexer::db::{keys, BulkLoader, SqliteStore};
use path_indexer::error::ConfigError;
use path_indexer::index::Pipeline;
use path_indexer::progress::{IndexEvent, Progress, ProgressReporter};
use path_indexer::walker::{DirReader, Entry, Node};
use path_indexer::{CancellationToken, Indexer};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn scratch_tree() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("photos/2023")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("notes.txt"), "n").unwrap();
    fs::write(root.join(".profile"), "p").unwrap();
    fs::write(root.join("photos/cover.jpg"), "c").unwrap();
    fs::write(root.join("photos/2023/a.tar.gz"), "a").unwrap();
    fs::write(root.join("photos/2023/Makefile"), "m").unwrap();
    dir
}

fn index(root: &Path, db: &Path) -> path_indexer::RunSummary {
    let indexer = Indexer::new(IndexConfig::new(db));
    let run = indexer.start(root).unwrap();
    for _ in run.events().iter() {}
    run.wait().unwrap()
}

#[test]
fn test_index_twice_adds_no_rows() {
    let tree = scratch_tree();
    let out = tempdir().unwrap();
    let db = out.path().join("paths.db");

    let first = index(tree.path(), &db);
    assert!(first.completed);
    assert_eq!(first.processed, 5);
    assert_eq!(first.inserted, 5);

    let second = index(tree.path(), &db);
    assert_eq!(second.processed, 5);
    assert_eq!(second.inserted, 0);

    let store = SqliteStore::open(&db, IndexConfig::new(&db).command_timeout).unwrap();
    assert_eq!(store.row_count().unwrap(), 5);
}

#[test]
fn test_new_files_picked_up_on_rerun() {
    let tree = scratch_tree();
    let out = tempdir().unwrap();
    let db = out.path().join("paths.db");

    index(tree.path(), &db);
    fs::write(tree.path().join("empty/late.md"), "l").unwrap();
    let second = index(tree.path(), &db);

    assert_eq!(second.processed, 6);
    assert_eq!(second.inserted, 1);
}

#[test]
fn test_columns_and_run_metadata() {
    let tree = scratch_tree();
    let out = tempdir().unwrap();
    let db = out.path().join("paths.db");
    let summary = index(tree.path(), &db);

    let store = SqliteStore::open(&db, IndexConfig::new(&db).command_timeout).unwrap();
    let root = summary.root.clone();
    let path_of = |rel: &str| root.join(rel).to_string_lossy().into_owned();

    let archive = store.get_by_path(&path_of("photos/2023/a.tar.gz")).unwrap().unwrap();
    assert_eq!(archive.file_name.as_deref(), Some("a.tar.gz"));
    assert_eq!(archive.extension.as_deref(), Some(".gz"));
    assert_eq!(
        archive.directory_path.as_deref(),
        Some(path_of("photos/2023").as_str())
    );

    let makefile = store.get_by_path(&path_of("photos/2023/Makefile")).unwrap().unwrap();
    assert_eq!(makefile.extension, None);

    let profile = store.get_by_path(&path_of(".profile")).unwrap().unwrap();
    assert_eq!(profile.extension.as_deref(), Some(".profile"));

    let info: HashMap<&str, String> = store.index_info().unwrap().into_iter().collect();
    assert_eq!(info[keys::STATUS], "completed");
    assert_eq!(info[keys::PROCESSED], "5");
    assert_eq!(info[keys::TOTAL], "5");
    assert_eq!(info[keys::INSERTED], "5");
    assert_eq!(info[keys::LAST_ROOT], root.to_string_lossy());
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_not_merged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tree = tempdir().unwrap();
    fs::write(tree.path().join(OsStr::from_bytes(b"a\xff.txt")), "1").unwrap();
    fs::write(tree.path().join(OsStr::from_bytes(b"a\xfe.txt")), "2").unwrap();
    let out = tempdir().unwrap();
    let db = out.path().join("paths.db");

    let first = index(tree.path(), &db);
    assert_eq!(first.processed, 2);
    assert_eq!(first.inserted, 2);

    let second = index(tree.path(), &db);
    assert_eq!(second.inserted, 0);

    let store = SqliteStore::open(&db, IndexConfig::new(&db).command_timeout).unwrap();
    assert_eq!(store.row_count().unwrap(), 2);
}

/// Serves a fixed tree; directories missing from the map are unreadable
struct FakeReader(HashMap<PathBuf, Vec<Node>>);

impl DirReader for FakeReader {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        self.0
            .get(dir)
            .map(|nodes| nodes.iter().cloned().map(Ok).collect())
            .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }
}

#[test]
fn test_unreadable_directory_is_skipped() {
    let reader = FakeReader(HashMap::from([
        (
            PathBuf::from("/a"),
            vec![Node::file("/a/1.txt"), Node::dir("/a/b"), Node::dir("/a/c")],
        ),
        (PathBuf::from("/a/b"), vec![Node::file("/a/b/2.log")]),
    ]));

    let config = IndexConfig::new(":memory:");
    let (tx, rx) = crossbeam_channel::unbounded();
    let reporter = ProgressReporter::new(tx, &config);
    let pipeline = Pipeline::with_reader(config, reader, reporter, CancellationToken::new());
    let mut loader = BulkLoader::new(SqliteStore::open_in_memory().unwrap());

    let summary = pipeline.run(Path::new("/a"), &mut loader).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped_nodes, 1);
    assert_eq!(loader.store().row_count().unwrap(), 2);

    let events: Vec<IndexEvent> = rx.try_iter().collect();
    let denied = events
        .iter()
        .filter(|e| matches!(e, IndexEvent::Log(l) if l.message.starts_with("Access denied: /a/c")))
        .count();
    assert_eq!(denied, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        IndexEvent::Progress {
            progress: Progress::Percent(0),
            processed: 0
        }
    )));
}

#[test]
fn test_cli_parsing() {
    let args = CliArgs::parse_from(["path-indexer", "/srv", "-o", "x.db", "-b", "20000", "--no-count"]);
    assert_eq!(args.root.as_deref(), Some(Path::new("/srv")));
    let config = IndexConfig::from_args(&args).unwrap();
    assert_eq!(config.batch_size, 20_000);
    assert!(!config.count_first);

    let args = CliArgs::parse_from(["path-indexer", "/srv", "-b", "100"]);
    assert!(matches!(
        IndexConfig::from_args(&args),
        Err(ConfigError::InvalidBatchSize { size: 100, .. })
    ));

    let args = CliArgs::parse_from(["path-indexer", "stats", "x.db", "--top", "5"]);
    match args.command {
        Some(Command::Stats { db, top }) => {
            assert_eq!(db, PathBuf::from("x.db"));
            assert_eq!(top, 5);
        }
        None => panic!("expected stats subcommand"),
    }
}
