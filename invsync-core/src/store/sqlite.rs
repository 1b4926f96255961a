//! SQLite document store.
//!
//! Each document is stored as JSON text in a per-collection table:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS inventories (
//!     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//!     data       TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! Filters compile to `json_extract(data, '$.field') = ?` clauses, so field
//! names are restricted to plain identifiers.
//!
//! - WAL mode for concurrent reads while players save.
//! - Optional CRC-32 checksum detects on-disk corruption.
//! - `replace_one` runs its delete and insert in one transaction.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Document, DocumentStore, Filter, UpsertOutcome};
use crate::config::StoreConfig;
use crate::error::{Result, SyncError};

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

/// Whether `name` is safe to splice into SQL as a table or JSON path segment.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Handle to an open SQLite database holding one document collection.
///
/// # Usage
///
/// ```no_run
/// # use invsync_core::config::StoreConfig;
/// # use invsync_core::store::{DocumentStore, Filter, SqliteStore};
/// let store = SqliteStore::open("inventories.db", &StoreConfig::default())?;
/// let found = store.find_one(&Filter::new().with_field("uuid", "11111111-1111-1111-1111-111111111111"))?;
/// # Ok::<(), invsync_core::SyncError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("table", &self.table)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// The collection table is created if missing. WAL mode is enabled when
    /// `config.wal_mode` is `true`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the collection name is not a plain
    /// identifier, or [`SyncError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;
        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;

        let store = Self::with_connection(conn, config, db_path)?;
        info!(
            path = %store.db_path.display(),
            collection = %store.table,
            wal = config.wal_mode,
            "Inventory store opened"
        );
        Ok(store)
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] or [`SyncError::Database`] as for [`open`](Self::open).
    pub fn open_in_memory(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, config, PathBuf::from(":memory:"))
    }

    fn with_connection(conn: Connection, config: &StoreConfig, db_path: PathBuf) -> Result<Self> {
        if !is_identifier(&config.collection) {
            return Err(SyncError::Config(format!(
                "collection name must be a plain identifier: {:?}",
                config.collection
            )));
        }
        let table = config.collection.clone();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                data       TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                checksum   TEXT
            );
            CREATE INDEX IF NOT EXISTS {table}_uuid ON {table} (json_extract(data, '$.uuid'));"
        ))?;

        Ok(Self {
            conn: Mutex::new(conn),
            table,
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run an integrity check. `Ok(false)` means corruption was detected.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    fn insert_with(&self, conn: &Connection, doc: &Document) -> Result<()> {
        let json = serde_json::to_string(doc)?;
        let checksum = self.checksum_enabled.then(|| crc32_hex(json.as_bytes()));
        let now = Utc::now().to_rfc3339();
        conn.execute(
            &format!("INSERT INTO {} (data, updated_at, checksum) VALUES (?1, ?2, ?3)", self.table),
            params![json, now, checksum],
        )?;
        Ok(())
    }

    fn delete_with(&self, conn: &Connection, filter: &Filter) -> Result<bool> {
        let (clause, values) = where_clause(filter)?;
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {t} WHERE id = (SELECT id FROM {t} WHERE {clause} ORDER BY id LIMIT 1)",
                t = self.table
            ),
            params_from_iter(values.iter()),
        )?;
        Ok(deleted > 0)
    }
}

/// Compile a filter into a SQL condition and its bound values.
fn where_clause(filter: &Filter) -> Result<(String, Vec<SqlValue>)> {
    if filter.fields().is_empty() {
        return Ok(("1 = 1".to_string(), Vec::new()));
    }
    let mut clauses = Vec::with_capacity(filter.fields().len());
    let mut values = Vec::with_capacity(filter.fields().len());
    for (field, value) in filter.fields() {
        if !is_identifier(field) {
            return Err(SyncError::InvalidFilter(format!("field name {field:?}")));
        }
        values.push(to_sql_value(field, value)?);
        clauses.push(format!("json_extract(data, '$.{field}') = ?{}", values.len()));
    }
    Ok((clauses.join(" AND "), values))
}

fn to_sql_value(field: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .ok_or_else(|| SyncError::InvalidFilter(format!("{field}: unsupported number {n}"))),
        other => Err(SyncError::InvalidFilter(format!(
            "{field}: only scalar values can be matched, got {other}"
        ))),
    }
}

impl DocumentStore for SqliteStore {
    fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        let start = Instant::now();
        let (clause, values) = where_clause(filter)?;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT data, checksum FROM {} WHERE {clause} ORDER BY id LIMIT 1",
            self.table
        ))?;
        let row: Option<(String, Option<String>)> = stmt
            .query_row(params_from_iter(values.iter()), |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(data.as_bytes());
                if expected != actual {
                    warn!(
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, document may be corrupt"
                    );
                }
            }
        }

        let doc: Document = serde_json::from_str(&data)?;
        debug!(
            bytes = data.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded document"
        );
        Ok(Some(doc))
    }

    fn insert(&self, doc: Document) -> Result<()> {
        let conn = self.conn.lock();
        self.insert_with(&conn, &doc)
    }

    fn delete_one(&self, filter: &Filter) -> Result<bool> {
        let conn = self.conn.lock();
        self.delete_with(&conn, filter)
    }

    fn count(&self, filter: &Filter) -> Result<usize> {
        let (clause, values) = where_clause(filter)?;
        let count: i64 = self.conn.lock().query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {clause}", self.table),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn replace_one(&self, filter: &Filter, doc: Document) -> Result<UpsertOutcome> {
        let start = Instant::now();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let replaced = self.delete_with(&tx, filter)?;
        self.insert_with(&tx, &doc)?;
        tx.commit()?;

        debug!(
            replaced,
            elapsed_us = start.elapsed().as_micros(),
            "Replaced document"
        );
        Ok(if replaced {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
