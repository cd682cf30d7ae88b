//! Snapshot store.
//!
//! Persists one row per captured snapshot in a local SQLite database:
//! - snapshots: id, target_key, url, captured_ms, content
//!
//! Ordering within a target is `(captured_ms, id)`. Capture timestamps have
//! millisecond precision; the AUTOINCREMENT id breaks ties, so identifiers
//! are strictly increasing per target even for appends landing in the same
//! millisecond. Nothing is ever overwritten.
//!
//! Retention lives here too: `prune` keeps the N most recent rows per
//! target and never removes the single most recent one, even when asked
//! to keep zero.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Stable storage key for a URL: 10 hex chars of its blake3 hash. Short
/// enough to read in logs, collision-resistant enough for an operator's
/// configured set.
pub fn target_key(url: &str) -> String {
    let hex = blake3::hash(url.as_bytes()).to_hex();
    hex.as_str()[..10].to_string()
}

/// One stored capture of a target's visible text.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub id: i64,
    pub target_key: String,
    pub url: String,
    pub captured_ms: i64,
    pub content: String,
}

/// History listing row; carries the content size instead of the content
/// so `history` never loads full page text.
#[derive(Debug, Serialize)]
pub struct SnapshotMeta {
    pub id: i64,
    pub target_key: String,
    pub url: String,
    pub captured_ms: i64,
    pub content_bytes: i64,
}

/// Default database path (~/.local/share/vigil/vigil.db or platform equivalent)
pub fn default_db_path() -> Result<PathBuf, StorageError> {
    let data_dir = directories::ProjectDirs::from("", "", "vigil")
        .ok_or(StorageError::NoDataDir)?
        .data_dir()
        .to_path_buf();
    Ok(data_dir.join("vigil.db"))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            target_key TEXT NOT NULL,
            url TEXT NOT NULL,
            captured_ms INTEGER NOT NULL,
            content TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_target
         ON snapshots(target_key, captured_ms, id)",
        [],
    )?;

    Ok(())
}

/// Storage operations the check cycle depends on. The detector and
/// orchestrator only see this seam, so any store that preserves per-target
/// insertion ordering can back it, and tests can inject failing ones.
pub trait SnapshotStore {
    fn most_recent(&self, key: &str) -> Result<Option<Snapshot>, StorageError>;
    fn append(&mut self, key: &str, url: &str, content: &str) -> Result<Snapshot, StorageError>;
    fn prune(&mut self, key: &str, keep: usize) -> Result<usize, StorageError>;
}

/// Database handle. Open once per command, reuse across all operations.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Store { conn })
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(&default_db_path()?)
    }

    /// The most recent snapshot for a target, or `None` if the target has
    /// never been observed. Absence is the normal first-run case, not an
    /// error.
    pub fn most_recent(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        let snapshot = self
            .conn
            .query_row(
                "SELECT id, target_key, url, captured_ms, content
                 FROM snapshots
                 WHERE target_key = ?1
                 ORDER BY captured_ms DESC, id DESC
                 LIMIT 1",
                params![key],
                snapshot_from_row,
            )
            .optional()?;

        Ok(snapshot)
    }

    /// Appends a new snapshot with a fresh capture timestamp.
    pub fn append(&mut self, key: &str, url: &str, content: &str) -> Result<Snapshot, StorageError> {
        self.append_at(key, url, content, chrono::Utc::now().timestamp_millis())
    }

    fn append_at(
        &mut self,
        key: &str,
        url: &str,
        content: &str,
        captured_ms: i64,
    ) -> Result<Snapshot, StorageError> {
        self.conn.execute(
            "INSERT INTO snapshots (target_key, url, captured_ms, content)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, url, captured_ms, content],
        )?;

        Ok(Snapshot {
            id: self.conn.last_insert_rowid(),
            target_key: key.to_string(),
            url: url.to_string(),
            captured_ms,
            content: content.to_string(),
        })
    }

    /// Deletes everything but the `keep` most recent snapshots for a target.
    /// A floor of one guards against a misconfigured keep of zero wiping the
    /// comparison baseline. Idempotent; returns the number of rows deleted.
    pub fn prune(&mut self, key: &str, keep: usize) -> Result<usize, StorageError> {
        let keep = keep.max(1);
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);

        let deleted = self.conn.execute(
            "DELETE FROM snapshots
             WHERE target_key = ?1
               AND id NOT IN (
                   SELECT id FROM snapshots
                   WHERE target_key = ?1
                   ORDER BY captured_ms DESC, id DESC
                   LIMIT ?2
               )",
            params![key, keep],
        )?;

        Ok(deleted)
    }

    /// Lists snapshots, newest first, for one target or for all of them.
    pub fn list(&self, key: Option<&str>) -> Result<Vec<SnapshotMeta>, StorageError> {
        let sql_all = "SELECT id, target_key, url, captured_ms, length(content)
                       FROM snapshots
                       ORDER BY captured_ms DESC, id DESC";
        let sql_one = "SELECT id, target_key, url, captured_ms, length(content)
                       FROM snapshots
                       WHERE target_key = ?1
                       ORDER BY captured_ms DESC, id DESC";

        let metas = match key {
            Some(key) => {
                let mut stmt = self.conn.prepare(sql_one)?;
                let rows = stmt.query_map(params![key], meta_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(sql_all)?;
                let rows = stmt.query_map([], meta_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(metas)
    }

    /// Loads one snapshot by id.
    pub fn get(&self, id: i64) -> Result<Option<Snapshot>, StorageError> {
        let snapshot = self
            .conn
            .query_row(
                "SELECT id, target_key, url, captured_ms, content
                 FROM snapshots
                 WHERE id = ?1",
                params![id],
                snapshot_from_row,
            )
            .optional()?;

        Ok(snapshot)
    }

    /// Every target key that has at least one stored snapshot.
    pub fn targets(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT target_key FROM snapshots ORDER BY target_key",
        )?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl SnapshotStore for Store {
    fn most_recent(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        Store::most_recent(self, key)
    }

    fn append(&mut self, key: &str, url: &str, content: &str) -> Result<Snapshot, StorageError> {
        Store::append(self, key, url, content)
    }

    fn prune(&mut self, key: &str, keep: usize) -> Result<usize, StorageError> {
        Store::prune(self, key, keep)
    }
}

fn snapshot_from_row(row: &rusqlite::Row) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        id: row.get(0)?,
        target_key: row.get(1)?,
        url: row.get(2)?,
        captured_ms: row.get(3)?,
        content: row.get(4)?,
    })
}

fn meta_from_row(row: &rusqlite::Row) -> rusqlite::Result<SnapshotMeta> {
    Ok(SnapshotMeta {
        id: row.get(0)?,
        target_key: row.get(1)?,
        url: row.get(2)?,
        captured_ms: row.get(3)?,
        content_bytes: row.get(4)?,
    })
}
