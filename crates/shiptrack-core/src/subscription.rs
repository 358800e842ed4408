// ── Event store access and live subscriptions ──
//
// The backend event store is append-only and has no push channel, so a
// live subscription is a background task that re-reads the list on an
// interval and republishes it through the `TimelineStore`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::TimelineEvent;
use crate::normalize::normalize_lifecycle_values;
use crate::store::TimelineStore;
use crate::stream::TimelineStream;

/// Read and append access to the per-shipment event list.
pub trait EventStore: Send + Sync {
    fn list_events(
        &self,
        shipment_id: &str,
    ) -> impl Future<Output = Result<Vec<Value>, CoreError>> + Send;

    /// Append one event document. `Ok(false)` means the store declined it.
    fn append_event(
        &self,
        shipment_id: &str,
        event: &Value,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;
}

/// Lifecycle events of shipments, kept in sync with an [`EventStore`].
pub struct EventFeed<S> {
    store: Arc<S>,
    timeline: TimelineStore,
    poll_interval: Duration,
}

impl<S> Clone for EventFeed<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeline: self.timeline.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl<S: EventStore + 'static> EventFeed<S> {
    pub fn new(store: Arc<S>, timeline: TimelineStore, poll_interval: Duration) -> Self {
        Self {
            store,
            timeline,
            poll_interval,
        }
    }

    pub fn timeline_store(&self) -> &TimelineStore {
        &self.timeline
    }

    /// Fetch, normalize, and publish a shipment's lifecycle events.
    pub async fn load(&self, shipment_id: &str) -> Result<Vec<TimelineEvent>, CoreError> {
        refresh_lifecycle(self.store.as_ref(), &self.timeline, shipment_id).await
    }

    /// Append an event to the store; on acceptance it is also published
    /// locally without waiting for the next poll.
    pub async fn record(&self, shipment_id: &str, event: TimelineEvent) -> Result<bool, CoreError> {
        if shipment_id.is_empty() {
            return Err(CoreError::MissingShipmentId);
        }
        if event.id.trim().is_empty() || event.status.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "event needs an id and a title".into(),
            });
        }
        let document = serde_json::to_value(&event)
            .map_err(|e| CoreError::Internal(format!("cannot encode event: {e}")))?;

        let accepted = self.store.append_event(shipment_id, &document).await?;
        if accepted {
            self.timeline.record_lifecycle(shipment_id, event);
        } else {
            warn!(shipment = shipment_id, "event store declined append");
        }
        Ok(accepted)
    }

    /// Start a live subscription. The first read happens immediately,
    /// then every `poll_interval`. Failed reads are logged and retried on
    /// the next tick.
    pub fn subscribe(&self, shipment_id: &str) -> Subscription {
        let stream = self.timeline.subscribe(shipment_id);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(
            Arc::clone(&self.store),
            self.timeline.clone(),
            shipment_id.to_owned(),
            self.poll_interval,
            cancel.clone(),
        ));
        Subscription {
            shipment_id: shipment_id.to_owned(),
            stream,
            cancel,
            handle: Some(handle),
        }
    }
}

async fn refresh_lifecycle<S: EventStore>(
    store: &S,
    timeline: &TimelineStore,
    shipment_id: &str,
) -> Result<Vec<TimelineEvent>, CoreError> {
    if shipment_id.is_empty() {
        return Err(CoreError::MissingShipmentId);
    }
    let raw = store.list_events(shipment_id).await?;
    let events = normalize_lifecycle_values(&raw, Utc::now());
    timeline.replace_lifecycle(shipment_id, events.clone());
    Ok(events)
}

async fn poll_task<S: EventStore>(
    store: Arc<S>,
    timeline: TimelineStore,
    shipment_id: String,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match refresh_lifecycle(store.as_ref(), &timeline, &shipment_id).await {
                    Ok(events) => debug!(shipment = %shipment_id, count = events.len(), "event poll"),
                    Err(e) => warn!(
                        shipment = %shipment_id,
                        error = %e,
                        transient = e.is_transient(),
                        "event poll failed"
                    ),
                }
            }
        }
    }
    debug!(shipment = %shipment_id, "event subscription stopped");
}

/// Handle to a running subscription. Dropping it stops the poller.
pub struct Subscription {
    shipment_id: String,
    stream: TimelineStream,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn shipment_id(&self) -> &str {
        &self.shipment_id
    }

    /// The merged timeline this subscription keeps fresh.
    pub fn timeline(&mut self) -> &mut TimelineStream {
        &mut self.stream
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop polling and wait for the task to finish.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "event subscription task ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    #[derive(Default)]
    struct MemoryStore {
        events: Mutex<Vec<Value>>,
        reads: AtomicUsize,
        fail_reads: AtomicUsize,
        reject_appends: bool,
    }

    impl EventStore for MemoryStore {
        async fn list_events(&self, _shipment_id: &str) -> Result<Vec<Value>, CoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) > 0 {
                self.fail_reads.fetch_sub(1, Ordering::SeqCst);
                return Err(CoreError::Api {
                    message: "unavailable".into(),
                    status: Some(503),
                });
            }
            Ok(self.events.lock().unwrap().clone())
        }

        async fn append_event(&self, _shipment_id: &str, event: &Value) -> Result<bool, CoreError> {
            if self.reject_appends {
                return Ok(false);
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(true)
        }
    }

    fn doc(id: &str, hour: u32) -> Value {
        json!({
            "id": id,
            "eventType": "user_action",
            "title": "Note added",
            "timestamp": format!("2024-02-01T{hour:02}:00:00Z"),
            "source": "user"
        })
    }

    fn feed(store: MemoryStore) -> EventFeed<MemoryStore> {
        EventFeed::new(Arc::new(store), TimelineStore::new(), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn load_normalizes_and_publishes() {
        let store = MemoryStore::default();
        store.events.lock().unwrap().extend([doc("a", 1), json!(7), doc("b", 2)]);
        let feed = feed(store);

        let events = feed.load("S1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(feed.timeline_store().counts("S1"), (0, 2));
    }

    #[tokio::test]
    async fn empty_shipment_id_is_rejected() {
        let feed = feed(MemoryStore::default());
        assert!(matches!(feed.load("").await, Err(CoreError::MissingShipmentId)));
    }

    #[tokio::test]
    async fn record_publishes_only_accepted_events() {
        let feed_ok = feed(MemoryStore::default());
        let event = normalize_lifecycle_values(&[doc("n1", 3)], Utc::now()).remove(0);
        assert!(feed_ok.record("S1", event.clone()).await.unwrap());
        assert!(feed_ok.timeline_store().event("S1", "n1").is_some());

        let feed_rejecting = feed(MemoryStore {
            reject_appends: true,
            ..MemoryStore::default()
        });
        assert!(!feed_rejecting.record("S1", event).await.unwrap());
        assert!(!feed_rejecting.timeline_store().has_events("S1"));
    }

    #[tokio::test]
    async fn record_rejects_incomplete_events() {
        let store = Arc::new(MemoryStore::default());
        let feed = EventFeed::new(Arc::clone(&store), TimelineStore::new(), Duration::from_secs(10));
        let mut event = normalize_lifecycle_values(&[doc("n2", 3)], Utc::now()).remove(0);
        event.status = "  ".into();

        let err = feed.record("S1", event).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_polls_until_dropped() {
        let store = Arc::new(MemoryStore::default());
        store.fail_reads.store(1, Ordering::SeqCst);
        let feed = EventFeed::new(Arc::clone(&store), TimelineStore::new(), Duration::from_secs(10));

        let mut sub = feed.subscribe("S9");
        assert_eq!(sub.shipment_id(), "S9");

        // First read fails; the poller keeps going.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);

        store.events.lock().unwrap().push(doc("late", 5));
        let next = sub.timeline().changed().await.unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);

        sub.unsubscribe().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_subscription_cancels_poller() {
        let store = Arc::new(MemoryStore::default());
        let feed = EventFeed::new(Arc::clone(&store), TimelineStore::new(), Duration::from_secs(5));
        let sub = feed.subscribe("S1");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(sub.is_active());
        drop(sub);

        let reads = store.reads.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.reads.load(Ordering::SeqCst), reads);
    }
}
