use std::pin::Pin;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use shared::{
    domain::{Event, EventId},
    protocol::{CreateEventResponse, StoreEvent},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Full-collection snapshots pushed by the store. The stream ending, for any
/// reason, means the subscription is lost.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Vec<Event>> + Send>>;

/// Boundary to the remote persistent store. Mutation failures are recoverable
/// and leave the session intact; losing the subscription is not.
#[async_trait]
pub trait RemoteEventStore: Send + Sync {
    /// Persists `event`, returning the authoritative id the store assigned
    /// (which may supersede the provisional one the event carries).
    async fn create(&self, event: &Event) -> Result<EventId>;
    async fn delete(&self, id: &EventId) -> Result<()>;
    async fn subscribe(&self) -> Result<SnapshotStream>;
}

pub struct MissingRemoteStore;

#[async_trait]
impl RemoteEventStore for MissingRemoteStore {
    async fn create(&self, event: &Event) -> Result<EventId> {
        Err(anyhow!(
            "remote event store unavailable for create of '{}'",
            event.title
        ))
    }

    async fn delete(&self, id: &EventId) -> Result<()> {
        Err(anyhow!(
            "remote event store unavailable for delete of event {id}"
        ))
    }

    async fn subscribe(&self) -> Result<SnapshotStream> {
        Err(anyhow!("remote event store unavailable for subscribe"))
    }
}

/// Document-store transport: JSON documents over HTTP for mutations, a
/// websocket watch endpoint for snapshot pushes.
pub struct HttpRemoteStore {
    http: Client,
    base_url: String,
    collection: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            collection: collection.into(),
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/collections/{}/documents",
            self.base_url, self.collection
        )
    }

    fn watch_url(&self) -> Result<String> {
        let ws_base = if self.base_url.starts_with("https://") {
            self.base_url.replacen("https://", "wss://", 1)
        } else if self.base_url.starts_with("http://") {
            self.base_url.replacen("http://", "ws://", 1)
        } else {
            return Err(anyhow!(
                "store base url must start with http:// or https://"
            ));
        };
        Ok(format!("{ws_base}/collections/{}/watch", self.collection))
    }
}

#[async_trait]
impl RemoteEventStore for HttpRemoteStore {
    async fn create(&self, event: &Event) -> Result<EventId> {
        let response: CreateEventResponse = self
            .http
            .post(self.documents_url())
            .json(event)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.id)
    }

    async fn delete(&self, id: &EventId) -> Result<()> {
        self.http
            .delete(format!("{}/{id}", self.documents_url()))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<SnapshotStream> {
        let watch_url = self.watch_url()?;
        let (ws_stream, _) = connect_async(&watch_url)
            .await
            .with_context(|| format!("failed to connect watch stream: {watch_url}"))?;
        let (_, mut ws_reader) = ws_stream.split();

        let (tx, rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<StoreEvent>(&text) {
                        Ok(StoreEvent::Snapshot { events }) => {
                            debug!(events = events.len(), "watch: snapshot frame received");
                            if tx.send(events).await.is_err() {
                                break;
                            }
                        }
                        Ok(StoreEvent::Error(err)) => {
                            warn!("watch: store signalled failure: {err}");
                            break;
                        }
                        Err(err) => {
                            warn!("watch: skipping malformed frame: {err}");
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!("watch: receive failed: {err}");
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
