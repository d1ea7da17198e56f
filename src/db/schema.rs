//! Database schema definitions and creation
//!
//! This module defines the SQLite schema for the durable file index, the
//! per-connection staging table and the run metadata table.

use rusqlite::{Connection, OptionalExtension};

/// Current schema version for migrations
pub const SCHEMA_VERSION: u32 = 2;

/// Durable inventory, one row per distinct path
/// Note: INTEGER PRIMARY KEY (without AUTOINCREMENT) still auto-assigns ids.
/// `path_key` holds the raw path bytes and is the identity; `full_path` is
/// its display form and only differs for paths that are not valid UTF-8.
const CREATE_FILE_INDEX_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS file_index (
    id INTEGER PRIMARY KEY,
    path_key BLOB NOT NULL UNIQUE,
    full_path TEXT NOT NULL,
    file_name TEXT,
    extension TEXT,
    directory_path TEXT,
    status INTEGER NOT NULL DEFAULT 0,   -- 0=not processed, 1=processed, 2=duplicated, 3=error
    status_detail TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Run metadata
const CREATE_INDEX_INFO_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS index_info (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// Secondary indexes for common lookups
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_file_index_full_path ON file_index(full_path)",
    "CREATE INDEX IF NOT EXISTS idx_file_index_extension ON file_index(extension)",
    "CREATE INDEX IF NOT EXISTS idx_file_index_directory ON file_index(directory_path)",
];

/// Staging lives in the connection's temp schema, so it is private to the
/// worker and disappears with the connection.
const CREATE_STAGING_TABLE: &str = r#"
DROP TABLE IF EXISTS temp.stage_file_index;
CREATE TEMP TABLE stage_file_index (
    path_key BLOB NOT NULL,
    full_path TEXT NOT NULL,
    file_name TEXT,
    extension TEXT,
    directory_path TEXT
);
"#;

pub const INSERT_STAGING: &str = "INSERT INTO temp.stage_file_index \
     (path_key, full_path, file_name, extension, directory_path) VALUES (?1, ?2, ?3, ?4, ?5)";

pub const CLEAR_STAGING: &str = "DELETE FROM temp.stage_file_index";

/// Insert-if-absent. Paths staged twice in one batch keep their first row.
pub const MERGE_STAGING: &str = r#"
INSERT INTO main.file_index (path_key, full_path, file_name, extension, directory_path)
SELECT s.path_key, s.full_path, s.file_name, s.extension, s.directory_path
FROM temp.stage_file_index AS s
WHERE s.rowid IN (
        SELECT MIN(rowid) FROM temp.stage_file_index GROUP BY path_key
    )
  AND NOT EXISTS (
        SELECT 1 FROM main.file_index AS t WHERE t.path_key = s.path_key
    )
ORDER BY s.rowid
"#;

/// SQLite pragmas for bulk loading; no exclusive locking so that a second
/// indexer on the same database waits on the busy timeout instead of failing
const WRITE_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;      -- 64MB cache
PRAGMA temp_store = MEMORY;
"#;

/// Create the durable tables if absent; safe to call on every run
pub fn create_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(WRITE_PRAGMAS)?;

    conn.execute(CREATE_FILE_INDEX_TABLE, [])?;
    conn.execute(CREATE_INDEX_INFO_TABLE, [])?;
    for sql in CREATE_INDEXES {
        conn.execute(sql, [])?;
    }

    set_index_info(conn, keys::SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;
    Ok(())
}

/// Drop and recreate the empty staging table
pub fn create_staging(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_STAGING_TABLE)?;
    Ok(())
}

/// Store run metadata
pub fn set_index_info(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO index_info (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Get run metadata
pub fn get_index_info(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM index_info WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
}

/// Metadata keys written after each run
pub mod keys {
    /// Root folder of the last run
    pub const LAST_ROOT: &str = "last_root";

    /// Timestamp when the last run started (RFC 3339)
    pub const START_TIME: &str = "start_time";

    /// Timestamp when the last run ended (RFC 3339)
    pub const END_TIME: &str = "end_time";

    /// "completed", "interrupted" or "failed"
    pub const STATUS: &str = "status";

    /// Files seen by the main pass
    pub const PROCESSED: &str = "processed";

    /// Files seen by the counting pass (0 = unknown)
    pub const TOTAL: &str = "total";

    /// Rows added by the last run
    pub const INSERTED: &str = "inserted";

    pub const SCHEMA_VERSION: &str = "schema_version";

    pub const INDEXER_VERSION: &str = "indexer_version";

    /// Display order for `stats`
    pub const ALL: &[&str] = &[
        LAST_ROOT,
        STATUS,
        START_TIME,
        END_TIME,
        PROCESSED,
        TOTAL,
        INSERTED,
        SCHEMA_VERSION,
        INDEXER_VERSION,
    ];
}
