//! Configuration store and response sink contracts.
//!
//! The configuration service is external; the widget consumes it through
//! point reads, point writes, and a per-tenant subscription that delivers
//! added/modified/removed change events in store order. Responses go to an
//! append-only sink. Reference implementations: in-memory (tests, demo)
//! and HTTP (production service).

pub mod http;
pub mod jsonl;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{PopupConfiguration, ResponseRecord};
use crate::error::Result;

pub use http::{HttpConfigStore, HttpResponseSink};
pub use jsonl::JsonlResponseSink;
pub use memory::{MemoryConfigStore, MemoryResponseSink};

/// How a configuration record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Record appeared (including the initial delivery on subscribe)
    Added,
    /// Record was replaced
    Modified,
    /// Record was deleted
    Removed,
}

/// One change event delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigChange {
    /// What happened to the record
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// The record after the change; absent for removals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<PopupConfiguration>,
}

impl ConfigChange {
    /// An added event carrying the given record.
    pub fn added(record: PopupConfiguration) -> Self {
        Self {
            kind: ChangeKind::Added,
            record: Some(record),
        }
    }

    /// A modified event carrying the given record.
    pub fn modified(record: PopupConfiguration) -> Self {
        Self {
            kind: ChangeKind::Modified,
            record: Some(record),
        }
    }

    /// A removed event.
    pub fn removed() -> Self {
        Self {
            kind: ChangeKind::Removed,
            record: None,
        }
    }
}

/// Receiver half of a live change feed.
pub type ChangeReceiver = mpsc::UnboundedReceiver<ConfigChange>;

/// Cancels the underlying change feed when dropped.
///
/// Every subscription hands one of these out; holding it keeps the feed
/// alive, dropping it (or calling [`Subscription::cancel`]) releases the
/// store-side resources on every exit path.
pub struct Subscription {
    canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Build a subscription around a cancellation action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            canceller: Some(Box::new(cancel)),
        }
    }

    /// Cancel explicitly instead of via drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.canceller.is_some())
            .finish()
    }
}

/// Key-value configuration service with change notifications.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Point read of one tenant's record.
    async fn get(&self, tenant: &str) -> Result<Option<PopupConfiguration>>;

    /// Point write of one tenant's record; subscribers observe an
    /// `added` or `modified` event.
    async fn set(&self, tenant: &str, record: PopupConfiguration) -> Result<()>;

    /// Delete one tenant's record; subscribers observe a `removed` event.
    async fn remove(&self, tenant: &str) -> Result<()>;

    /// Open a live change feed for one tenant.
    ///
    /// If a record already exists, the feed starts with an `added` event
    /// for it; afterwards changes arrive in store order, one event per
    /// write, never coalesced.
    async fn subscribe(&self, tenant: &str) -> Result<(ChangeReceiver, Subscription)>;
}

/// Append-only store of submitted responses.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Append one record.
    async fn append(&self, record: ResponseRecord) -> Result<()>;
}
