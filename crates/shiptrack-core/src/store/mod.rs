// ── Reactive timeline store ──
//
// Per-shipment holder for tracking and lifecycle events. Every mutation
// re-merges the shipment's timeline and publishes it on a `watch`
// channel that `TimelineStream`s read from.

mod collection;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Shipment, TimelineEvent};
use crate::stream::TimelineStream;
use crate::timeline::merge_timeline;

use collection::EventCollection;

struct ShipmentTimeline {
    shipment: watch::Sender<Arc<Shipment>>,
    tracking: EventCollection,
    lifecycle: EventCollection,
    merged: watch::Sender<Arc<Vec<TimelineEvent>>>,
}

impl ShipmentTimeline {
    fn new(shipment: Shipment) -> Self {
        let (shipment, _) = watch::channel(Arc::new(shipment));
        let (merged, _) = watch::channel(Arc::new(Vec::new()));
        let timeline = Self {
            shipment,
            tracking: EventCollection::new(),
            lifecycle: EventCollection::new(),
            merged,
        };
        timeline.republish();
        timeline
    }

    fn owned(events: &[Arc<TimelineEvent>]) -> Vec<TimelineEvent> {
        events.iter().map(|e| TimelineEvent::clone(e)).collect()
    }

    /// Re-merge from the latest collections. Computing inside
    /// `send_modify` serializes concurrent republishes, so a stale merge
    /// can never overwrite a newer one.
    fn republish(&self) {
        self.merged.send_modify(|merged| {
            let shipment = self.shipment.borrow().clone();
            *merged = Arc::new(merge_timeline(
                &Self::owned(&self.tracking.snapshot()),
                &Self::owned(&self.lifecycle.snapshot()),
                &shipment,
            ));
        });
    }
}

/// Shared, concurrent store of per-shipment timelines.
///
/// Cloning is cheap; all clones see the same data.
#[derive(Clone, Default)]
pub struct TimelineStore {
    inner: Arc<DashMap<String, Arc<ShipmentTimeline>>>,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, shipment_id: &str) -> Arc<ShipmentTimeline> {
        if let Some(existing) = self.inner.get(shipment_id) {
            return Arc::clone(existing.value());
        }
        let created = self
            .inner
            .entry(shipment_id.to_owned())
            .or_insert_with(|| {
                Arc::new(ShipmentTimeline::new(Shipment {
                    id: shipment_id.to_owned(),
                    ..Shipment::default()
                }))
            });
        Arc::clone(created.value())
    }

    /// Register or refresh the shipment record used for the synthetic
    /// `created` entry.
    pub fn track(&self, shipment: &Shipment) {
        let entry = self.entry(&shipment.id);
        entry.shipment.send_replace(Arc::new(shipment.clone()));
        entry.republish();
    }

    /// Replace the carrier tracking events with the latest payload.
    pub fn apply_tracking(&self, shipment_id: &str, events: Vec<TimelineEvent>) {
        let entry = self.entry(shipment_id);
        entry.tracking.replace_all(events);
        entry.republish();
    }

    /// Replace the lifecycle events with a fresh store snapshot.
    pub fn replace_lifecycle(&self, shipment_id: &str, events: Vec<TimelineEvent>) {
        let entry = self.entry(shipment_id);
        entry.lifecycle.replace_all(events);
        entry.republish();
    }

    /// Add or replace a single lifecycle event. Returns `true` if it was new.
    pub fn record_lifecycle(&self, shipment_id: &str, event: TimelineEvent) -> bool {
        let entry = self.entry(shipment_id);
        let is_new = entry.lifecycle.upsert(event);
        entry.republish();
        is_new
    }

    /// Look up one event by id across both sources.
    pub fn event(&self, shipment_id: &str, event_id: &str) -> Option<Arc<TimelineEvent>> {
        let entry = self.inner.get(shipment_id)?;
        entry
            .lifecycle
            .get(event_id)
            .or_else(|| entry.tracking.get(event_id))
    }

    /// `(tracking, lifecycle)` event counts.
    pub fn counts(&self, shipment_id: &str) -> (usize, usize) {
        self.inner
            .get(shipment_id)
            .map_or((0, 0), |e| (e.tracking.len(), e.lifecycle.len()))
    }

    pub fn has_events(&self, shipment_id: &str) -> bool {
        self.inner
            .get(shipment_id)
            .is_some_and(|e| !(e.tracking.is_empty() && e.lifecycle.is_empty()))
    }

    /// Merged timeline against a caller-supplied shipment record.
    pub fn timeline(&self, shipment: &Shipment) -> Vec<TimelineEvent> {
        let Some(entry) = self.inner.get(&shipment.id) else {
            return merge_timeline(&[], &[], shipment);
        };
        merge_timeline(
            &ShipmentTimeline::owned(&entry.tracking.snapshot()),
            &ShipmentTimeline::owned(&entry.lifecycle.snapshot()),
            shipment,
        )
    }

    /// Live view of a shipment's merged timeline.
    pub fn subscribe(&self, shipment_id: &str) -> TimelineStream {
        TimelineStream::new(self.entry(shipment_id).merged.subscribe())
    }

    /// Drop everything held for a shipment. Open streams end.
    pub fn forget(&self, shipment_id: &str) -> bool {
        self.inner.remove(shipment_id).is_some()
    }

    pub fn shipment_ids(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }
}
