//! Durable store on SQLite.
//!
//! One connection behind a mutex; each add is a single
//! `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement, so the increment
//! and the read of its result cannot interleave with another caller. Calls run
//! on tokio's blocking pool.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection};

use tally_core::counter::{is_valid_name, Count, CounterKey};
use tally_core::error::{Result, TallyError};

use super::CounterStore;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

struct Inner {
    conn: Connection,
    // tables already created on this connection
    tables: HashSet<String>,
}

#[derive(Clone)]
pub struct SqliteCounterStore {
    inner: Arc<Mutex<Inner>>,
}

impl SqliteCounterStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            TallyError::Store(format!("open sqlite failed ({}): {e}", path.display()))
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TallyError::Store(format!("open sqlite failed (memory): {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| TallyError::Store(format!("sqlite busy_timeout: {e}")))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                conn,
                tables: HashSet::new(),
            })),
        })
    }

    fn add_blocking(&self, key: &CounterKey, delta: u64) -> Result<Count> {
        if !is_valid_name(&key.table) {
            return Err(TallyError::Store(format!("invalid table name: {:?}", key.table)));
        }
        let delta = i64::try_from(delta)
            .map_err(|_| TallyError::Store(format!("delta out of range: {delta}")))?;

        let mut inner = self
            .inner
            .lock()
            .map_err(|_| TallyError::Store("sqlite connection mutex poisoned".into()))?;

        if !inner.tables.contains(&key.table) {
            inner
                .conn
                .execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" (
                        id        TEXT    NOT NULL,
                        attribute TEXT    NOT NULL,
                        value     INTEGER NOT NULL,
                        PRIMARY KEY (id, attribute)
                    );",
                    key.table
                ))
                .map_err(|e| TallyError::Store(format!("create table {}: {e}", key.table)))?;
            inner.tables.insert(key.table.clone());
        }

        let sql = format!(
            "INSERT INTO \"{}\" (id, attribute, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (id, attribute) DO UPDATE SET value = value + excluded.value
             WHERE value <= {} - excluded.value
             RETURNING value",
            key.table,
            i64::MAX
        );
        let value: i64 = inner
            .conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| {
                stmt.query_row(params![key.id, key.attribute, delta], |row| row.get(0))
            })
            .map_err(|e| match e {
                // the guarded upsert touched no row: the add would overflow
                rusqlite::Error::QueryReturnedNoRows => {
                    TallyError::Store(format!("counter overflow adding {delta} at {key}"))
                }
                e => TallyError::Store(format!("update {key}: {e}")),
            })?;

        u64::try_from(value)
            .map(Count::new)
            .map_err(|_| TallyError::Store(format!("negative value stored at {key}: {value}")))
    }
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn add_and_get(&self, key: &CounterKey, delta: u64) -> Result<Count> {
        let this = self.clone();
        let key = key.clone();
        tokio::task::spawn_blocking(move || this.add_blocking(&key, delta))
            .await
            .map_err(|e| TallyError::Internal(format!("sqlite task failed: {e}")))?
    }
}
