//! Batch store capability and its SQLite implementation

use crate::db::schema::{self, keys};
use crate::error::{StoreError, StoreResult};
use crate::index::{FileRecord, RunSummary};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// The store operations the bulk loader needs
///
/// Staging is unconstrained scratch space scoped to one connection; the
/// durable table enforces path uniqueness on the raw path bytes.
pub trait BatchStore {
    /// Create the durable table if it does not exist yet
    fn create_table_if_absent(&mut self) -> StoreResult<()>;

    /// Drop and recreate an empty staging area
    fn reset_staging(&mut self) -> StoreResult<()>;

    /// Append records to staging without uniqueness checks
    fn insert_staging(&mut self, records: &[FileRecord]) -> StoreResult<()>;

    /// Insert staged rows whose path key is absent from the durable table;
    /// returns the number of rows inserted
    fn merge_staging(&mut self) -> StoreResult<u64>;

    /// Empty staging for the next batch
    fn clear_staging(&mut self) -> StoreResult<()>;
}

/// Per-row processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    NotProcessed,
    Processed,
    Duplicated,
    Error,
}

impl FileStatus {
    pub fn as_db_int(self) -> i64 {
        match self {
            FileStatus::NotProcessed => 0,
            FileStatus::Processed => 1,
            FileStatus::Duplicated => 2,
            FileStatus::Error => 3,
        }
    }

    pub fn from_db_int(value: i64) -> Option<Self> {
        match value {
            0 => Some(FileStatus::NotProcessed),
            1 => Some(FileStatus::Processed),
            2 => Some(FileStatus::Duplicated),
            3 => Some(FileStatus::Error),
            _ => None,
        }
    }
}

/// A row of the durable table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub id: i64,
    pub full_path: String,
    pub file_name: Option<String>,
    pub extension: Option<String>,
    pub directory_path: Option<String>,
    pub status: Option<FileStatus>,
    pub status_detail: Option<String>,
    pub created_at: String,
}

/// SQLite-backed store owning a single connection
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    ///
    /// `timeout` bounds how long any statement waits on a lock held by
    /// another connection.
    pub fn open(path: &Path, timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(timeout)?;
        debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rows in the durable table
    pub fn row_count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM file_index", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Rows currently staged
    pub fn staged_count(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM temp.stage_file_index",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Look a row up by its display path; for lossy non-UTF-8 paths the
    /// oldest matching row wins
    pub fn get_by_path(&self, full_path: &str) -> StoreResult<Option<IndexedFile>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, full_path, file_name, extension, directory_path, status, status_detail, created_at
             FROM file_index WHERE full_path = ?1 ORDER BY id LIMIT 1",
        )?;
        let row = stmt
            .query_row([full_path], |row| {
                Ok(IndexedFile {
                    id: row.get(0)?,
                    full_path: row.get(1)?,
                    file_name: row.get(2)?,
                    extension: row.get(3)?,
                    directory_path: row.get(4)?,
                    status: FileStatus::from_db_int(row.get(5)?),
                    status_detail: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Most common extensions, `None` for files without one
    pub fn extension_counts(&self, top: usize) -> StoreResult<Vec<(Option<String>, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT extension, COUNT(*) AS n FROM file_index
             GROUP BY extension ORDER BY n DESC, extension LIMIT ?1",
        )?;
        let rows = stmt
            .query_map([top as i64], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Write the outcome of a run into `index_info`
    pub fn record_run(
        &self,
        root: &Path,
        started_at: DateTime<Utc>,
        status: &str,
        summary: Option<&RunSummary>,
    ) -> StoreResult<()> {
        schema::set_index_info(&self.conn, keys::LAST_ROOT, &root.to_string_lossy())?;
        schema::set_index_info(&self.conn, keys::START_TIME, &started_at.to_rfc3339())?;
        schema::set_index_info(&self.conn, keys::END_TIME, &Utc::now().to_rfc3339())?;
        schema::set_index_info(&self.conn, keys::STATUS, status)?;
        schema::set_index_info(&self.conn, keys::INDEXER_VERSION, env!("CARGO_PKG_VERSION"))?;
        if let Some(summary) = summary {
            schema::set_index_info(&self.conn, keys::PROCESSED, &summary.processed.to_string())?;
            schema::set_index_info(&self.conn, keys::TOTAL, &summary.total.to_string())?;
            schema::set_index_info(&self.conn, keys::INSERTED, &summary.inserted.to_string())?;
        }
        Ok(())
    }

    /// All known run metadata in display order
    pub fn index_info(&self) -> StoreResult<Vec<(&'static str, String)>> {
        let mut out = Vec::new();
        for key in keys::ALL {
            if let Some(value) = schema::get_index_info(&self.conn, key)? {
                out.push((*key, value));
            }
        }
        Ok(out)
    }
}

impl BatchStore for SqliteStore {
    fn create_table_if_absent(&mut self) -> StoreResult<()> {
        schema::create_database(&self.conn).map_err(StoreError::Schema)
    }

    fn reset_staging(&mut self) -> StoreResult<()> {
        schema::create_staging(&self.conn).map_err(StoreError::Staging)
    }

    fn insert_staging(&mut self, records: &[FileRecord]) -> StoreResult<()> {
        let stage = |conn: &mut Connection| -> rusqlite::Result<()> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(schema::INSERT_STAGING)?;
                for record in records {
                    stmt.execute(params![
                        record.path_key,
                        record.full_path,
                        record.file_name,
                        record.extension,
                        record.directory_path,
                    ])?;
                }
            }
            tx.commit()
        };
        stage(&mut self.conn).map_err(StoreError::Staging)
    }

    fn merge_staging(&mut self) -> StoreResult<u64> {
        // IMMEDIATE takes the write lock before the NOT EXISTS check, so no
        // other writer can insert a matching path between match and insert
        let merge = |conn: &mut Connection| -> rusqlite::Result<usize> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let inserted = tx.execute(schema::MERGE_STAGING, [])?;
            tx.execute(schema::CLEAR_STAGING, [])?;
            tx.commit()?;
            Ok(inserted)
        };
        let inserted = merge(&mut self.conn).map_err(StoreError::Merge)?;
        Ok(inserted as u64)
    }

    fn clear_staging(&mut self) -> StoreResult<()> {
        self.conn
            .execute(schema::CLEAR_STAGING, [])
            .map_err(StoreError::Staging)?;
        Ok(())
    }
}
