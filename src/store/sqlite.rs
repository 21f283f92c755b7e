//! SQLite-backed document store
//!
//! Documents live in a single table keyed by (collection, id). Every write
//! bumps the document's version and is broadcast to the document's change
//! feed while the connection lock is still held, so subscribers observe
//! snapshots in commit order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::error::{StoreError, StoreResult};
use super::types::{DocumentKey, DocumentSnapshot, DocumentWrite, Precondition, Subscription};
use super::DocumentStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,             -- JSON object
    version INTEGER NOT NULL,
    update_time TEXT NOT NULL,      -- RFC 3339
    PRIMARY KEY (collection, id)
);
"#;

/// Default capacity of each document's change feed
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// Document store on top of a single SQLite connection
pub struct SqliteDocumentStore {
    /// std::sync::Mutex because rusqlite::Connection is !Sync
    conn: Mutex<Connection>,
    /// Change feed per document
    feeds: Mutex<HashMap<DocumentKey, broadcast::Sender<DocumentSnapshot>>>,
    feed_capacity: usize,
}

impl SqliteDocumentStore {
    /// Open the store at `path`, creating the file and schema if needed
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        tracing::info!(path = ?path.as_ref(), "Opened document store");
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            feeds: Mutex::new(HashMap::new()),
            feed_capacity: DEFAULT_FEED_CAPACITY,
        })
    }

    /// Override the change feed capacity for feeds created from now on
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity.max(1);
        self
    }

    fn lock_conn(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(format!("connection: {}", e)))
    }

    fn lock_feeds(
        &self,
    ) -> StoreResult<std::sync::MutexGuard<'_, HashMap<DocumentKey, broadcast::Sender<DocumentSnapshot>>>>
    {
        self.feeds
            .lock()
            .map_err(|e| StoreError::Lock(format!("feeds: {}", e)))
    }

    /// Attach a receiver to the document's feed, creating the feed if needed.
    ///
    /// Feeds whose subscribers are all gone are dropped here, so the map only
    /// holds documents someone is still following.
    fn join_feed(&self, key: &DocumentKey) -> StoreResult<broadcast::Receiver<DocumentSnapshot>> {
        let mut feeds = self.lock_feeds()?;
        feeds.retain(|_, tx| tx.receiver_count() > 0);

        let capacity = self.feed_capacity;
        Ok(feeds
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe())
    }

    /// Broadcast a committed snapshot; a feed nobody listens to is removed
    fn publish(&self, snapshot: &DocumentSnapshot) -> StoreResult<()> {
        let mut feeds = self.lock_feeds()?;
        let abandoned = feeds
            .get(&snapshot.key)
            .is_some_and(|tx| tx.send(snapshot.clone()).is_err());
        if abandoned {
            feeds.remove(&snapshot.key);
        }
        Ok(())
    }

    fn read(conn: &Connection, key: &DocumentKey) -> StoreResult<DocumentSnapshot> {
        let row = conn
            .query_row(
                "SELECT data, version, update_time FROM documents WHERE collection = ?1 AND id = ?2",
                params![key.collection, key.id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((data, version, update_time)) => Ok(DocumentSnapshot {
                key: key.clone(),
                data: Some(serde_json::from_str(&data)?),
                version: version.max(0) as u64,
                update_time: DateTime::parse_from_rfc3339(&update_time)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            }),
            None => Ok(DocumentSnapshot::missing(key.clone())),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, key: &DocumentKey) -> StoreResult<DocumentSnapshot> {
        key.validate()?;
        let conn = self.lock_conn()?;
        Self::read(&conn, key)
    }

    async fn set(&self, key: &DocumentKey, write: DocumentWrite) -> StoreResult<DocumentSnapshot> {
        key.validate()?;
        let conn = self.lock_conn()?;

        let current: u64 = conn
            .query_row(
                "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
                params![key.collection, key.id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|v| v.max(0) as u64)
            .unwrap_or(0);

        if let Precondition::Version(expected) = write.precondition {
            if expected != current {
                return Err(StoreError::Conflict {
                    key: key.clone(),
                    expected,
                    actual: current,
                });
            }
        }

        let now = Utc::now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut data = write.data;
        for field in write.server_timestamps {
            data.insert(field, Value::String(stamp.clone()));
        }
        let body = Value::Object(data);
        let version = current + 1;

        conn.execute(
            r#"
            INSERT INTO documents (collection, id, data, version, update_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (collection, id) DO UPDATE SET
                data = excluded.data,
                version = excluded.version,
                update_time = excluded.update_time
            "#,
            params![
                key.collection,
                key.id,
                serde_json::to_string(&body)?,
                version as i64,
                stamp,
            ],
        )?;

        let snapshot = DocumentSnapshot {
            key: key.clone(),
            data: Some(body),
            version,
            update_time: Some(now),
        };

        self.publish(&snapshot)?;
        drop(conn);

        tracing::debug!(document = %key, version = version, "Document written");
        Ok(snapshot)
    }

    async fn subscribe(&self, key: &DocumentKey) -> StoreResult<Subscription> {
        key.validate()?;

        // Register before reading so no commit falls between the two
        let receiver = self.join_feed(key)?;
        let initial = {
            let conn = self.lock_conn()?;
            Self::read(&conn, key)?
        };

        tracing::debug!(document = %key, version = initial.version, "Subscription opened");
        Ok(Subscription::new(key.clone(), initial, receiver))
    }

    fn active_subscriptions(&self, key: &DocumentKey) -> usize {
        self.feeds
            .lock()
            .ok()
            .and_then(|feeds| feeds.get(key).map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }

    async fn ping(&self) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
