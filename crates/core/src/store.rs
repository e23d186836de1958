// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable store for the action queue, session, and caches.
//!
//! The [`DurableStore`] owns the on-disk representation of every queued
//! action, the current [`Session`], and the read-through cache mirrors. Each
//! operation runs in its own transaction and is committed (with
//! `synchronous = FULL`) before it returns, so a caller may assume the
//! mutation survives an immediate crash.
//!
//! After each committed mutation the store broadcasts a [`StoreEvent`];
//! components subscribe once at startup instead of polling.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::action::Action;
use crate::cache::CachedEntity;
use crate::error::{Error, Result};
use crate::queue::{DeadLetter, ItemId, ItemStatus, QueueItem};
use crate::session::Session;

/// Schema migrations, applied in order. The index + 1 is the schema version
/// recorded in `PRAGMA user_version` once the step has run.
const MIGRATIONS: &[&str] = &[
    // v1: the action queue
    r#"
    CREATE TABLE IF NOT EXISTS queue (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        action_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        enqueued_at TEXT NOT NULL,
        retry_count INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'pending'
    );
    "#,
    // v2: session and read-through caches
    r#"
    CREATE TABLE IF NOT EXISTS session (
        key TEXT PRIMARY KEY CHECK (key = 'current'),
        driver_id TEXT NOT NULL,
        token TEXT NOT NULL,
        route_id TEXT,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS cache (
        kind TEXT NOT NULL,
        id TEXT NOT NULL,
        data TEXT NOT NULL,
        cached_at TEXT NOT NULL,
        PRIMARY KEY (kind, id)
    );
    "#,
    // v3: quarantine for undeliverable items, sync metadata
    r#"
    CREATE TABLE IF NOT EXISTS dead_letters (
        id INTEGER PRIMARY KEY,
        action_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        enqueued_at TEXT NOT NULL,
        retry_count INTEGER NOT NULL,
        reason TEXT NOT NULL,
        failed_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_queue_status ON queue(status);
    "#,
    // v4: rejections counted apart from transient failures
    r#"
    ALTER TABLE queue ADD COLUMN rejected_count INTEGER NOT NULL DEFAULT 0;
    "#,
];

/// Current schema version.
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

const SESSION_KEY: &str = "current";
const META_LAST_SYNC: &str = "last_sync_at";
const EVENT_CAPACITY: usize = 256;

/// What changed in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueChange {
    Enqueued(ItemId),
    Removed(ItemId),
    RetryRecorded(ItemId),
    DeadLettered(ItemId),
}

/// Notification emitted after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    QueueChanged { change: QueueChange, pending: usize },
    SessionChanged { present: bool },
    CacheChanged { kind: String },
}

/// Run all pending schema migrations.
///
/// Migrations only ever add tables, columns and indexes, so upgrading an
/// older database never loses rows. Returns the resulting schema version.
pub fn run_migrations(conn: &mut Connection) -> Result<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current > SCHEMA_VERSION {
        return Err(Error::StorageUnavailable(format!(
            "schema version {current} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = index as u32 + 1;
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        tracing::debug!(version, "applied store migration");
    }

    Ok(SCHEMA_VERSION)
}

/// A dispatch is only ever in memory. Anything that reads as in flight on
/// open was left by an older build and goes back to pending.
fn reset_in_flight(conn: &Connection) -> Result<usize> {
    let reset = conn.execute(
        "UPDATE queue SET status = 'pending' WHERE status = 'in_flight'",
        [],
    )?;
    if reset > 0 {
        tracing::warn!(reset, "reset in-flight queue items to pending");
    }
    Ok(reset)
}

fn check_integrity(conn: &Connection) -> Result<()> {
    let verdict: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
    if verdict != "ok" {
        return Err(Error::corrupted(format!("integrity check failed: {verdict}")));
    }
    Ok(())
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(format!("invalid timestamp '{value}' in column '{column}'")))
}

/// Parse a JSON document from the database.
fn parse_json(value: &str, column: &str) -> std::result::Result<Value, rusqlite::Error> {
    serde_json::from_str(value)
        .map_err(|e| conversion_error(format!("invalid JSON in column '{column}': {e}")))
}

fn parse_status(value: &str) -> std::result::Result<ItemStatus, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| conversion_error(format!("invalid value '{value}' in column 'status'")))
}

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::corrupted(message)),
    )
}

fn row_to_item(row: &rusqlite::Row<'_>) -> std::result::Result<QueueItem, rusqlite::Error> {
    let payload: String = row.get(2)?;
    let enqueued: String = row.get(3)?;
    let status: String = row.get(5)?;
    Ok(QueueItem {
        id: row.get(0)?,
        action_type: row.get(1)?,
        payload: parse_json(&payload, "payload")?,
        enqueued_at: parse_timestamp(&enqueued, "enqueued_at")?,
        retry_count: row.get(4)?,
        status: parse_status(&status)?,
    })
}

fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::StorageUnavailable(e.to_string()))
}

fn count_pending(tx: &Transaction<'_>) -> Result<usize> {
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM queue WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

/// Durable container for queued actions, the session, and cached entities.
///
/// Shared between producers and the dispatcher (wrap it in an `Arc`); the
/// connection sits behind a mutex so every operation is one atomic step.
pub struct DurableStore {
    conn: Mutex<Connection>,
    events: broadcast::Sender<StoreEvent>,
}

impl DurableStore {
    /// Open the store at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
            }
        }

        let mut conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;
        check_integrity(&conn)?;
        run_migrations(&mut conn)?;
        Self::init(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        run_migrations(&mut conn)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        reset_in_flight(&conn)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(DurableStore {
            conn: Mutex::new(conn),
            events,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("store lock poisoned".to_string()))
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Subscribe to committed mutations.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Schema version of the open database.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queue
    // ─────────────────────────────────────────────────────────────────────

    /// Append an action to the queue. Returns the assigned id.
    pub fn enqueue(&self, action: &Action) -> Result<ItemId> {
        self.enqueue_raw(action.action_type.as_str(), &action.payload)
    }

    /// Append an action by raw tag. The tag is not validated here; unknown
    /// tags are dead-lettered by the dispatcher.
    pub fn enqueue_raw(&self, action_type: &str, payload: &Value) -> Result<ItemId> {
        let payload = to_json(payload)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO queue (action_type, payload, enqueued_at, retry_count, status)
             VALUES (?1, ?2, ?3, 0, 'pending')",
            params![action_type, payload, Utc::now().to_rfc3339()],
        )?;
        let id = tx.last_insert_rowid();
        let pending = count_pending(&tx)?;
        tx.commit()?;
        drop(conn);

        tracing::debug!(id, action_type, pending, "enqueued action");
        self.emit(StoreEvent::QueueChanged {
            change: QueueChange::Enqueued(id),
            pending,
        });
        Ok(id)
    }

    /// Remove an item. Returns false if it was already gone.
    pub fn remove(&self, id: ItemId) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM queue WHERE id = ?1", params![id])? > 0;
        let pending = count_pending(&tx)?;
        tx.commit()?;
        drop(conn);

        if removed {
            self.emit(StoreEvent::QueueChanged {
                change: QueueChange::Removed(id),
                pending,
            });
        }
        Ok(removed)
    }

    /// All pending items in insertion order. This order is what replay follows.
    pub fn list_pending(&self) -> Result<Vec<QueueItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, action_type, payload, enqueued_at, retry_count, status
             FROM queue WHERE status = 'pending' ORDER BY id ASC",
        )?;
        let items = stmt
            .query_map([], row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Get a queue item by id.
    pub fn get(&self, id: ItemId) -> Result<Option<QueueItem>> {
        let conn = self.conn()?;
        let item = conn
            .query_row(
                "SELECT id, action_type, payload, enqueued_at, retry_count, status
                 FROM queue WHERE id = ?1",
                params![id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// Number of items waiting to be replayed.
    pub fn pending_count(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let pending = count_pending(&tx)?;
        tx.commit()?;
        Ok(pending)
    }

    /// Count a failed replay attempt. Returns the new retry count.
    pub fn record_failure(&self, id: ItemId) -> Result<u32> {
        self.bump_attempts(id, "retry_count = retry_count + 1", "retry_count")
    }

    /// Count a rejected replay attempt. It also counts as a retry.
    /// Returns the number of rejections so far.
    pub fn record_rejection(&self, id: ItemId) -> Result<u32> {
        self.bump_attempts(
            id,
            "retry_count = retry_count + 1, rejected_count = rejected_count + 1",
            "rejected_count",
        )
    }

    fn bump_attempts(&self, id: ItemId, assignments: &str, counter: &str) -> Result<u32> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let affected = tx.execute(
            &format!("UPDATE queue SET {assignments} WHERE id = ?1"),
            params![id],
        )?;
        if affected == 0 {
            return Err(Error::ItemNotFound(id));
        }
        let count: u32 = tx.query_row(
            &format!("SELECT {counter} FROM queue WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )?;
        let pending = count_pending(&tx)?;
        tx.commit()?;
        drop(conn);

        self.emit(StoreEvent::QueueChanged {
            change: QueueChange::RetryRecorded(id),
            pending,
        });
        Ok(count)
    }

    /// Move an item out of the live queue into quarantine.
    ///
    /// Returns false if the item was no longer queued.
    pub fn dead_letter(&self, id: ItemId, reason: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let moved = tx.execute(
            "INSERT OR REPLACE INTO dead_letters
                 (id, action_type, payload, enqueued_at, retry_count, reason, failed_at)
             SELECT id, action_type, payload, enqueued_at, retry_count, ?2, ?3
             FROM queue WHERE id = ?1",
            params![id, reason, Utc::now().to_rfc3339()],
        )? > 0;
        if moved {
            tx.execute("DELETE FROM queue WHERE id = ?1", params![id])?;
        }
        let pending = count_pending(&tx)?;
        tx.commit()?;
        drop(conn);

        if moved {
            self.emit(StoreEvent::QueueChanged {
                change: QueueChange::DeadLettered(id),
                pending,
            });
        }
        Ok(moved)
    }

    /// Quarantined items, oldest first.
    pub fn list_dead_letters(&self) -> Result<Vec<DeadLetter>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, action_type, payload, enqueued_at, retry_count, 'failed', reason, failed_at
             FROM dead_letters ORDER BY id ASC",
        )?;
        let letters = stmt
            .query_map([], |row| {
                let failed_at: String = row.get(7)?;
                Ok(DeadLetter {
                    item: row_to_item(row)?,
                    reason: row.get(6)?,
                    failed_at: parse_timestamp(&failed_at, "failed_at")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(letters)
    }

    /// Delete all quarantined items. Returns how many were removed.
    pub fn purge_dead_letters(&self) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM dead_letters", [])?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────

    /// The current session, or `None` if absent or expired.
    ///
    /// An expired session is deleted as part of the read.
    pub fn get_session(&self) -> Result<Option<Session>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let session = tx
            .query_row(
                "SELECT driver_id, token, route_id, expires_at, created_at
                 FROM session WHERE key = ?1",
                params![SESSION_KEY],
                |row| {
                    let expires: String = row.get(3)?;
                    let created: String = row.get(4)?;
                    Ok(Session {
                        driver_id: row.get(0)?,
                        token: row.get(1)?,
                        route_id: row.get(2)?,
                        expires_at: parse_timestamp(&expires, "expires_at")?,
                        created_at: parse_timestamp(&created, "created_at")?,
                    })
                },
            )
            .optional()?;

        let Some(session) = session else {
            tx.commit()?;
            return Ok(None);
        };
        if !session.is_expired() {
            tx.commit()?;
            return Ok(Some(session));
        }

        tx.execute("DELETE FROM session WHERE key = ?1", params![SESSION_KEY])?;
        tx.commit()?;
        drop(conn);
        tracing::info!(driver_id = %session.driver_id, "session expired");
        self.emit(StoreEvent::SessionChanged { present: false });
        Ok(None)
    }

    /// Store the session, replacing any previous one.
    pub fn put_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO session (key, driver_id, token, route_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                SESSION_KEY,
                session.driver_id,
                session.token,
                session.route_id,
                session.expires_at.to_rfc3339(),
                session.created_at.to_rfc3339(),
            ],
        )?;
        drop(conn);
        self.emit(StoreEvent::SessionChanged { present: true });
        Ok(())
    }

    /// Destroy the session (logout).
    pub fn clear_session(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM session WHERE key = ?1", params![SESSION_KEY])?;
        drop(conn);
        self.emit(StoreEvent::SessionChanged { present: false });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read-through cache
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the whole mirror for `kind`. Never merges with older rows.
    pub fn put_cached_entities(&self, kind: &str, entities: &[CachedEntity]) -> Result<()> {
        let rows = entities
            .iter()
            .map(|e| Ok((e.id.as_str(), to_json(&e.data)?, e.cached_at.to_rfc3339())))
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cache WHERE kind = ?1", params![kind])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO cache (kind, id, data, cached_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (id, data, cached_at) in &rows {
                stmt.execute(params![kind, id, data, cached_at])?;
            }
        }
        tx.commit()?;
        drop(conn);

        self.emit(StoreEvent::CacheChanged {
            kind: kind.to_string(),
        });
        Ok(())
    }

    /// The last mirror stored for `kind`, in the order it was stored.
    pub fn get_cached_entities(&self, kind: &str) -> Result<Vec<CachedEntity>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, data, cached_at FROM cache WHERE kind = ?1 ORDER BY rowid ASC",
        )?;
        let entities = stmt
            .query_map(params![kind], |row| {
                let data: String = row.get(1)?;
                let cached_at: String = row.get(2)?;
                Ok(CachedEntity {
                    id: row.get(0)?,
                    data: parse_json(&data, "data")?,
                    cached_at: parse_timestamp(&cached_at, "cached_at")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entities)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Metadata
    // ─────────────────────────────────────────────────────────────────────

    /// When a drain last left the queue empty.
    pub fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![META_LAST_SYNC],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            None => Ok(None),
            Some(s) => Ok(Some(parse_timestamp(&s, "meta.value")?)),
        }
    }

    pub fn set_last_sync_at(&self, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![META_LAST_SYNC, at.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
