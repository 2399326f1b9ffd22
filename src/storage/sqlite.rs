//! Embedded sqlite catalog for the persisted graph.
//!
//! Writes happen once at the end of a run; afterwards the catalog is only
//! opened read-only. Busy databases are retried with linear backoff before
//! surfacing a lock error.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags};

use crate::error::{AtlasError, Result};
use crate::storage::{Field, Row, StorageWriter};

const LOCK_RETRIES: u32 = 3;
const LOCK_BACKOFF: Duration = Duration::from_secs(2);

pub struct SqliteCatalog {
    conn: Connection,
    read_only: bool,
}

impl SqliteCatalog {
    /// Creates (or truncates) a writable catalog.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS nodes;
            DROP TABLE IF EXISTS relationships;
            CREATE TABLE nodes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                name TEXT,
                file_path TEXT,
                properties TEXT NOT NULL
            );
            CREATE TABLE relationships (
                id TEXT PRIMARY KEY,
                rel_type TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                confidence REAL NOT NULL,
                reason TEXT,
                step INTEGER
            );
            "#,
        )?;
        Ok(Self {
            conn,
            read_only: false,
        })
    }

    /// Opens an existing catalog read-only; any write is rejected at this
    /// boundary.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AtlasError::NoIndex);
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn,
            read_only: true,
        })
    }

    pub fn node_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn relationship_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn guard_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(AtlasError::StorageUnavailable(
                "catalog is open read-only".to_string(),
            ));
        }
        Ok(())
    }

    /// Retries a busy/locked database with linear backoff (2s x attempt)
    /// before surfacing `StorageLocked`.
    fn with_lock_retry<T>(&self, mut op: impl FnMut(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op(&self.conn) {
                Ok(value) => return Ok(value),
                Err(e) if is_locked(&e) => {
                    attempt += 1;
                    if attempt > LOCK_RETRIES {
                        return Err(AtlasError::StorageLocked);
                    }
                    std::thread::sleep(LOCK_BACKOFF * attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_locked(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(info, _)
            if info.code == rusqlite::ErrorCode::DatabaseBusy
                || info.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

fn field_to_json(field: &Field) -> serde_json::Value {
    match field {
        Field::Str(s) => serde_json::Value::String(s.clone()),
        Field::Int(i) => serde_json::Value::from(*i),
        Field::Float(f) => serde_json::Value::from(*f),
        Field::Bool(b) => serde_json::Value::from(*b),
        Field::List(items) => serde_json::Value::from(items.clone()),
    }
}

fn field_str(row: &Row, index: usize) -> String {
    match row.0.get(index) {
        Some(Field::Str(s)) => s.clone(),
        Some(other) => field_to_json(other).to_string(),
        None => String::new(),
    }
}

impl StorageWriter for SqliteCatalog {
    fn write_nodes(&mut self, _label: &str, header: &[&str], rows: &[Row]) -> Result<()> {
        self.guard_writable()?;
        self.with_lock_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO nodes (id, label, name, file_path, properties)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for row in rows {
                    let properties: serde_json::Map<String, serde_json::Value> = header
                        .iter()
                        .zip(row.0.iter())
                        .map(|(key, field)| (key.to_string(), field_to_json(field)))
                        .collect();
                    let name = properties
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    let file_path = properties
                        .get("filePath")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    stmt.execute(params![
                        field_str(row, 0),
                        field_str(row, 1),
                        name,
                        file_path,
                        serde_json::Value::Object(properties).to_string(),
                    ])?;
                }
            }
            tx.commit()
        })
    }

    fn write_relationships(&mut self, _header: &[&str], rows: &[Row]) -> Result<()> {
        self.guard_writable()?;
        self.with_lock_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO relationships
                     (id, rel_type, source_id, target_id, confidence, reason, step)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for row in rows {
                    let confidence = match row.0.get(4) {
                        Some(Field::Float(f)) => *f,
                        Some(Field::Int(i)) => *i as f64,
                        _ => 1.0,
                    };
                    let step = match row.0.get(6) {
                        Some(Field::Int(i)) if *i >= 0 => Some(*i),
                        _ => None,
                    };
                    let reason = field_str(row, 5);
                    stmt.execute(params![
                        field_str(row, 0),
                        field_str(row, 1),
                        field_str(row, 2),
                        field_str(row, 3),
                        confidence,
                        if reason.is_empty() { None } else { Some(reason) },
                        step,
                    ])?;
                }
            }
            tx.commit()
        })
    }

    fn create_index(&mut self, kind: &str, params: &str) -> Result<()> {
        self.guard_writable()?;
        let name = format!("idx_{kind}_{params}");
        let sql = format!("CREATE INDEX IF NOT EXISTS {name} ON {kind} ({params})");
        self.with_lock_retry(|conn| conn.execute(&sql, []).map(|_| ()))
    }
}
