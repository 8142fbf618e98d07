//! Row-change fan-out. Writers publish `ChangeEvent`s to a broadcast hub; subscribers open a
//! topic channel (e.g. `notifications:<user_id>`) filtered by table and column.
//!
//! Events carry only the key columns of a row (`REALTIME_KEYS`), enough for channel filters and
//! cache invalidation; subscribers refetch the rows themselves. Delivery is best-effort: a
//! lagging receiver gets a `Resync` event in place of what it missed, and ordering across writers
//! is whatever the hub observed.

use crate::backend::{Filter, Row};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// PostgreSQL NOTIFY channel fed by the row-change trigger installed in `store`.
pub const PG_CHANNEL: &str = "daycare_changes";

const HUB_CAPACITY: usize = 256;

/// Columns carried in event records. Channel filters may only use these.
pub const REALTIME_KEYS: &[&str] = &["id", "user_id", "sender_id", "recipient_id", "child_id"];

/// `row` narrowed to `REALTIME_KEYS`.
pub fn key_columns(row: &Row) -> Row {
    row.iter()
        .filter(|(k, _)| REALTIME_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Events were dropped for this receiver; anything derived from the table may be stale.
    Resync,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub record: Option<Row>,
    #[serde(default)]
    pub old_record: Option<Row>,
}

impl ChangeEvent {
    /// The row the event is about: the new row, or the old one for deletes.
    pub fn row(&self) -> Option<&Row> {
        self.record.as_ref().or(self.old_record.as_ref())
    }
}

#[derive(Clone)]
pub struct Realtime {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for Realtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Realtime {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Realtime { tx }
    }

    /// Fan an event out to every open channel. Having no subscribers is fine.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Unfiltered receiver over every event.
    pub fn raw_receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Open a channel on `topic` listening to changes of `table`, optionally narrowed by `filter`.
    pub fn channel(&self, topic: &str, table: &str, filter: Option<Filter>) -> RealtimeChannel {
        tracing::info!(topic = %topic, table = %table, "realtime channel opened");
        RealtimeChannel {
            topic: topic.to_string(),
            table: table.to_string(),
            filter,
            rx: self.tx.subscribe(),
        }
    }
}

pub struct RealtimeChannel {
    topic: String,
    table: String,
    filter: Option<Filter>,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl RealtimeChannel {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn accepts(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        match (&self.filter, event.row()) {
            (None, _) => true,
            (Some(f), Some(row)) => f.matches(row),
            (Some(_), None) => false,
        }
    }

    /// Next matching event, or `None` once the hub is gone. After a lag the missed events cannot
    /// be filtered, so a `Resync` event for the channel's table is returned instead.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(ev) if self.accepts(&ev) => return Some(ev),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(topic = %self.topic, skipped = n, "realtime channel lagged; resyncing");
                    return Some(ChangeEvent {
                        table: self.table.clone(),
                        kind: ChangeKind::Resync,
                        record: None,
                        old_record: None,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Forward `NOTIFY daycare_changes` payloads from PostgreSQL into `hub`.
/// Runs until the task is aborted; malformed payloads are logged and skipped.
pub fn spawn_pg_bridge(pool: PgPool, hub: Realtime) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut listener = match PgListener::connect_with(&pool).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "realtime bridge could not connect");
                return;
            }
        };
        if let Err(e) = listener.listen(PG_CHANNEL).await {
            tracing::error!(error = %e, "realtime bridge could not LISTEN");
            return;
        }
        tracing::info!(channel = PG_CHANNEL, "realtime bridge listening");
        loop {
            match listener.recv().await {
                Ok(n) => match serde_json::from_str::<ChangeEvent>(n.payload()) {
                    Ok(ev) => hub.publish(ev),
                    Err(e) => tracing::warn!(error = %e, "realtime payload skipped"),
                },
                Err(e) => {
                    // PgListener reconnects on the next recv.
                    tracing::warn!(error = %e, "realtime bridge connection lost");
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
    })
}
