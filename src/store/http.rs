//! HTTP clients for the configuration service and the response sink.
//!
//! Point reads and writes are plain JSON over REST; the change feed is a
//! server-sent-event stream, one `ConfigChange` payload per event. The
//! stream is not re-established here on failure; reconnection is the
//! service's concern.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::mpsc;

use super::{ChangeReceiver, ConfigChange, ConfigStore, ResponseSink, Subscription};
use crate::domain::{PopupConfiguration, ResponseRecord};
use crate::error::Result;

/// Default timeout for point reads and writes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration service client.
pub struct HttpConfigStore {
    client: Client,
    base_url: String,
}

impl HttpConfigStore {
    /// Create a client against the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn record_url(&self, tenant: &str) -> String {
        format!("{}/popup-configuration/{}", self.base_url, tenant)
    }

    fn events_url(&self, tenant: &str) -> String {
        format!("{}/events", self.record_url(tenant))
    }
}

#[async_trait]
impl ConfigStore for HttpConfigStore {
    async fn get(&self, tenant: &str) -> Result<Option<PopupConfiguration>> {
        let response = self.client.get(self.record_url(tenant)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record = response.error_for_status()?.json().await?;
        Ok(Some(record))
    }

    async fn set(&self, tenant: &str, record: PopupConfiguration) -> Result<()> {
        self.client
            .put(self.record_url(tenant))
            .json(&record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn remove(&self, tenant: &str) -> Result<()> {
        let response = self.client.delete(self.record_url(tenant)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn subscribe(&self, tenant: &str) -> Result<(ChangeReceiver, Subscription)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut source = EventSource::get(self.events_url(tenant));
        let tenant_label = tenant.to_string();

        let task = tokio::spawn(async move {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {
                        log::debug!("Change feed open for tenant {}", tenant_label);
                    }
                    Ok(Event::Message(message)) => {
                        match serde_json::from_str::<ConfigChange>(&message.data) {
                            Ok(change) => {
                                if tx.send(change).is_err() {
                                    // Receiver gone, feed no longer needed.
                                    break;
                                }
                            }
                            Err(e) => {
                                log::warn!(
                                    "Undecodable change event for tenant {}: {}",
                                    tenant_label,
                                    e
                                );
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Change feed for tenant {} ended: {}", tenant_label, e);
                        break;
                    }
                }
            }
        });

        let subscription = Subscription::new(move || task.abort());
        Ok((rx, subscription))
    }
}

/// Response sink client; appends records with a single POST each.
pub struct HttpResponseSink {
    client: Client,
    base_url: String,
}

impl HttpResponseSink {
    /// Create a client against the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url)
    }
}

#[async_trait]
impl ResponseSink for HttpResponseSink {
    async fn append(&self, record: ResponseRecord) -> Result<()> {
        self.client
            .post(self.responses_url())
            .json(&record)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_url_shape() {
        let store = HttpConfigStore::new("http://localhost:8080/api/").unwrap();
        assert_eq!(
            store.record_url("t-1"),
            "http://localhost:8080/api/popup-configuration/t-1"
        );
    }

    #[test]
    fn test_events_url_shape() {
        let store = HttpConfigStore::new("http://localhost:8080/api").unwrap();
        assert_eq!(
            store.events_url("t-1"),
            "http://localhost:8080/api/popup-configuration/t-1/events"
        );
    }

    #[test]
    fn test_responses_url_shape() {
        let sink = HttpResponseSink::new("http://localhost:8080/api").unwrap();
        assert_eq!(sink.responses_url(), "http://localhost:8080/api/responses");
    }
}
