//! Bounded in-memory store for reconstructed events.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::hub::{ChangeHub, LogChannel};

use super::records::{ConsoleLogRecord, NetworkLogRecord, NetworkUpdate};
use super::ring::RingBuffer;

/// Console history capacity.
pub const CONSOLE_CAPACITY: usize = 5000;

/// Network history capacity.
pub const NETWORK_CAPACITY: usize = 2000;

#[derive(Debug)]
struct Buffers {
    console: RingBuffer<ConsoleLogRecord>,
    network: RingBuffer<NetworkLogRecord>,
}

/// Event store: two independent bounded buffers plus the change hub.
///
/// All mutation goes through a single write lock, so two files tailing
/// updates for the same network id cannot interleave a merge, and readers
/// never observe a half-merged record.
#[derive(Debug)]
pub struct LogStore {
    buffers: RwLock<Buffers>,
    hub: ChangeHub,
}

impl LogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacities(CONSOLE_CAPACITY, NETWORK_CAPACITY)
    }

    #[must_use]
    pub fn with_capacities(console: usize, network: usize) -> Self {
        Self {
            buffers: RwLock::new(Buffers {
                console: RingBuffer::new(console),
                network: RingBuffer::new(network),
            }),
            hub: ChangeHub::new(),
        }
    }

    /// The hub signalled on every mutation.
    #[must_use]
    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    /// Append a console record, evicting the oldest on overflow.
    pub async fn append_console(&self, record: ConsoleLogRecord) {
        {
            let mut buffers = self.buffers.write().await;
            if buffers.console.push(record).is_some() {
                tracing::trace!("Console buffer full, evicted oldest record");
            }
        }
        self.hub.notify(LogChannel::Console);
    }

    /// Insert or merge a partial network update, keyed by its id.
    ///
    /// An update matching an existing record merges into it. An unmatched
    /// update with a `url` starts a new exchange record; one without a `url`
    /// is a stray fragment (possibly for an already-evicted exchange) and is
    /// dropped. Returns whether the store mutated.
    ///
    /// Eviction on overflow is strictly FIFO and may discard an exchange
    /// that is still pending; its late fragments are then dropped by the
    /// `url` rule above rather than resurrecting a partial record.
    pub async fn upsert_network(
        &self,
        update: NetworkUpdate,
        fallback_session: Option<&str>,
    ) -> bool {
        let Some(id) = update.id.clone() else {
            return false;
        };

        {
            let mut buffers = self.buffers.write().await;
            let has_existing = buffers.network.iter().any(|record| record.id == id);
            if has_existing {
                if let Some(existing) =
                    buffers.network.iter_mut().find(|record| record.id == id)
                {
                    existing.apply(update, fallback_session);
                }
            } else if let Some(url) = update.url.clone() {
                let timestamp = update.timestamp.unwrap_or_else(Utc::now);
                let mut record = NetworkLogRecord::new(id, url, timestamp);
                record.apply(update, fallback_session);
                if buffers.network.push(record).is_some() {
                    tracing::trace!("Network buffer full, evicted oldest record");
                }
            } else {
                tracing::debug!(id = %id, "Dropping network fragment for unknown exchange");
                return false;
            }
        }
        self.hub.notify(LogChannel::Network);
        true
    }

    /// Ordered console history, oldest to newest.
    pub async fn console_snapshot(&self) -> Vec<ConsoleLogRecord> {
        self.buffers.read().await.console.snapshot()
    }

    /// Ordered network history, oldest to newest.
    pub async fn network_snapshot(&self) -> Vec<NetworkLogRecord> {
        self.buffers.read().await.network.snapshot()
    }

    pub async fn console_len(&self) -> usize {
        self.buffers.read().await.console.len()
    }

    pub async fn network_len(&self) -> usize {
        self.buffers.read().await.network.len()
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::records::ConsoleKind;

    fn console_record(content: &str) -> ConsoleLogRecord {
        ConsoleLogRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: Some("s1".to_string()),
            kind: ConsoleKind::Log,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn network_update(json: &str) -> NetworkUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_append_console_and_snapshot_order() {
        let store = LogStore::new();
        store.append_console(console_record("first")).await;
        store.append_console(console_record("second")).await;

        let snapshot = store.console_snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].content, "first");
        assert_eq!(snapshot[1].content, "second");
    }

    #[tokio::test]
    async fn test_console_eviction_at_capacity() {
        let store = LogStore::with_capacities(3, 3);
        for i in 0..4 {
            store.append_console(console_record(&format!("line-{i}"))).await;
        }

        let snapshot = store.console_snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].content, "line-1");
        assert_eq!(snapshot[2].content, "line-3");
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_merges() {
        let store = LogStore::new();

        let inserted = store
            .upsert_network(
                network_update(r#"{"id":"a","url":"http://x","pending":true}"#),
                Some("s1"),
            )
            .await;
        assert!(inserted);

        store
            .upsert_network(network_update(r#"{"id":"a","response":{"status":200}}"#), None)
            .await;
        store
            .upsert_network(
                network_update(r#"{"id":"a","response":{"durationMs":12}}"#),
                None,
            )
            .await;

        let snapshot = store.network_snapshot().await;
        assert_eq!(snapshot.len(), 1);
        let record = &snapshot[0];
        assert_eq!(record.url, "http://x");
        assert!(!record.pending);
        assert_eq!(record.session_id.as_deref(), Some("s1"));
        let response = record.response.as_ref().unwrap();
        assert_eq!(response.status, Some(200));
        assert_eq!(response.duration_ms, Some(12));
    }

    #[tokio::test]
    async fn test_upsert_drops_fragment_without_url_or_match() {
        let store = LogStore::new();

        let mutated = store
            .upsert_network(
                network_update(r#"{"id":"ghost","response":{"status":500}}"#),
                None,
            )
            .await;

        assert!(!mutated);
        assert!(store.network_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_drops_update_without_id() {
        let store = LogStore::new();

        let mutated = store
            .upsert_network(network_update(r#"{"url":"http://x"}"#), None)
            .await;

        assert!(!mutated);
        assert!(store.network_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_signal_the_hub() {
        use crate::hub::LogChannel;

        let store = LogStore::new();
        let mut console = store.hub().subscribe(LogChannel::Console);
        let mut network = store.hub().subscribe(LogChannel::Network);

        store.append_console(console_record("hello")).await;
        assert!(console.changed().await.is_ok());
        assert!(!network.has_changed().unwrap());

        store
            .upsert_network(network_update(r#"{"id":"a","url":"http://x"}"#), None)
            .await;
        assert!(network.changed().await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_update_does_not_signal() {
        use crate::hub::LogChannel;

        let store = LogStore::new();
        let network = store.hub().subscribe(LogChannel::Network);

        store
            .upsert_network(network_update(r#"{"id":"ghost","error":"x"}"#), None)
            .await;

        assert!(!network.has_changed().unwrap());
    }
}
