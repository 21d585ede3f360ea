//! In-memory configuration store and response sink.
//!
//! Process-local reference implementation of the store contracts, used by
//! the test suite and the demo path. Subscribers are registered per tenant;
//! dead subscribers are pruned on the next notification.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChangeReceiver, ConfigChange, ConfigStore, ResponseSink, Subscription};
use crate::domain::{PopupConfiguration, ResponseRecord};
use crate::error::{Result, SurveyrError};

type SubscriberMap = HashMap<String, Vec<(u64, mpsc::UnboundedSender<ConfigChange>)>>;

/// In-memory key-value configuration store with change notifications.
#[derive(Default)]
pub struct MemoryConfigStore {
    records: RwLock<HashMap<String, PopupConfiguration>>,
    subscribers: Arc<Mutex<SubscriberMap>>,
    next_subscriber_id: AtomicU64,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, tenant: &str, change: ConfigChange) {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(senders) = subscribers.get_mut(tenant) {
            senders.retain(|(_, sender)| sender.send(change.clone()).is_ok());
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, tenant: &str) -> Result<Option<PopupConfiguration>> {
        let records = self
            .records
            .read()
            .map_err(|e| SurveyrError::Store(e.to_string()))?;
        Ok(records.get(tenant).cloned())
    }

    async fn set(&self, tenant: &str, record: PopupConfiguration) -> Result<()> {
        let previous = {
            let mut records = self
                .records
                .write()
                .map_err(|e| SurveyrError::Store(e.to_string()))?;
            records.insert(tenant.to_string(), record.clone())
        };
        let change = if previous.is_none() {
            ConfigChange::added(record)
        } else {
            ConfigChange::modified(record)
        };
        self.notify(tenant, change);
        Ok(())
    }

    async fn remove(&self, tenant: &str) -> Result<()> {
        let existed = {
            let mut records = self
                .records
                .write()
                .map_err(|e| SurveyrError::Store(e.to_string()))?;
            records.remove(tenant).is_some()
        };
        if existed {
            self.notify(tenant, ConfigChange::removed());
        }
        Ok(())
    }

    async fn subscribe(&self, tenant: &str) -> Result<(ChangeReceiver, Subscription)> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Initial delivery: an existing record arrives as `added` before
        // any live change.
        if let Some(record) = self.get(tenant).await? {
            let _ = tx.send(ConfigChange::added(record));
        }

        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut subscribers = self
                .subscribers
                .lock()
                .map_err(|e| SurveyrError::Store(e.to_string()))?;
            subscribers
                .entry(tenant.to_string())
                .or_default()
                .push((id, tx));
        }

        let registry = self.subscribers.clone();
        let tenant_key = tenant.to_string();
        let subscription = Subscription::new(move || {
            if let Ok(mut subscribers) = registry.lock() {
                if let Some(senders) = subscribers.get_mut(&tenant_key) {
                    senders.retain(|(sender_id, _)| *sender_id != id);
                }
            }
        });

        Ok((rx, subscription))
    }
}

/// In-memory append-only response sink.
#[derive(Debug, Default)]
pub struct MemoryResponseSink {
    records: Mutex<Vec<ResponseRecord>>,
}

impl MemoryResponseSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn records(&self) -> Vec<ResponseRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of appended records.
    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseSink for MemoryResponseSink {
    async fn append(&self, record: ResponseRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| SurveyrError::Submission(e.to_string()))?;
        records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChangeKind;

    fn sample_config(wait_time: u64) -> PopupConfiguration {
        PopupConfiguration {
            rating_title: "Rate".to_string(),
            comment_title: "Comment".to_string(),
            placeholder: "".to_string(),
            wait_time,
            max_display: 3,
            display_frequency: 2,
        }
    }

    #[tokio::test]
    async fn test_get_absent_tenant() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.get("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryConfigStore::new();
        store.set("t1", sample_config(5)).await.unwrap();
        let loaded = store.get("t1").await.unwrap().unwrap();
        assert_eq!(loaded.wait_time, 5);
    }

    #[tokio::test]
    async fn test_subscribe_delivers_initial_added() {
        let store = MemoryConfigStore::new();
        store.set("t1", sample_config(5)).await.unwrap();

        let (mut rx, _subscription) = store.subscribe("t1").await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Added);
        assert_eq!(change.record.unwrap().wait_time, 5);
    }

    #[tokio::test]
    async fn test_subscribe_empty_tenant_delivers_nothing_initially() {
        let store = MemoryConfigStore::new();
        let (mut rx, _subscription) = store.subscribe("t1").await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_first_set_is_added_second_is_modified() {
        let store = MemoryConfigStore::new();
        let (mut rx, _subscription) = store.subscribe("t1").await.unwrap();

        store.set("t1", sample_config(5)).await.unwrap();
        store.set("t1", sample_config(9)).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Added);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Modified);
        assert_eq!(second.record.unwrap().wait_time, 9);
    }

    #[tokio::test]
    async fn test_remove_delivers_removed_without_record() {
        let store = MemoryConfigStore::new();
        store.set("t1", sample_config(5)).await.unwrap();

        let (mut rx, _subscription) = store.subscribe("t1").await.unwrap();
        let _ = rx.recv().await.unwrap(); // initial added

        store.remove("t1").await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Removed);
        assert!(change.record.is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_tenant_emits_nothing() {
        let store = MemoryConfigStore::new();
        let (mut rx, _subscription) = store.subscribe("t1").await.unwrap();
        store.remove("t1").await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_delivered_in_store_order() {
        let store = MemoryConfigStore::new();
        let (mut rx, _subscription) = store.subscribe("t1").await.unwrap();

        store.set("t1", sample_config(1)).await.unwrap();
        store.set("t1", sample_config(2)).await.unwrap();
        store.remove("t1").await.unwrap();
        store.set("t1", sample_config(3)).await.unwrap();

        let kinds: Vec<ChangeKind> = [
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
        ]
        .to_vec();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Added,
                ChangeKind::Modified,
                ChangeKind::Removed,
                ChangeKind::Added
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_subscription_stops_delivery() {
        let store = MemoryConfigStore::new();
        let (mut rx, subscription) = store.subscribe("t1").await.unwrap();

        subscription.cancel();
        store.set("t1", sample_config(5)).await.unwrap();

        // Sender side was deregistered; the channel yields nothing and
        // then reports disconnection.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_subscriptions_are_per_tenant() {
        let store = MemoryConfigStore::new();
        let (mut rx_a, _sub_a) = store.subscribe("a").await.unwrap();

        store.set("b", sample_config(5)).await.unwrap();
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_memory_sink_appends() {
        let sink = MemoryResponseSink::new();
        assert!(sink.is_empty());

        sink.append(ResponseRecord::new("t1", 7, "nice"))
            .await
            .unwrap();
        sink.append(ResponseRecord::new("t1", 3, "meh"))
            .await
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rating, 7);
        assert_eq!(records[1].review, "meh");
    }
}
