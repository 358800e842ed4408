// ── Reactive event collection ──
//
// Concurrent id-keyed storage that remembers insertion order, with the
// ordered snapshot republished on a `watch` channel after every mutation.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use crate::model::TimelineEvent;

/// Events for one shipment from one source, keyed by event id.
///
/// Re-upserting an existing id replaces the event but keeps its original
/// position, so snapshots stay in first-seen order.
pub(crate) struct EventCollection {
    by_id: DashMap<String, (u64, Arc<TimelineEvent>)>,
    next_seq: AtomicU64,
    snapshot: watch::Sender<Arc<Vec<Arc<TimelineEvent>>>>,
}

impl EventCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            next_seq: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Insert or replace an event. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, event: TimelineEvent) -> bool {
        let is_new = self.insert_quiet(event);
        self.rebuild_snapshot();
        is_new
    }

    /// Make the collection hold exactly `events`: upsert all, then prune
    /// ids not present. Subscribers never observe an empty intermediate.
    pub(crate) fn replace_all(&self, events: Vec<TimelineEvent>) {
        let incoming: HashSet<String> = events.iter().map(|e| e.id.clone()).collect();
        for event in events {
            self.insert_quiet(event);
        }
        self.by_id.retain(|id, _| incoming.contains(id));
        self.rebuild_snapshot();
    }

    pub(crate) fn get(&self, id: &str) -> Option<Arc<TimelineEvent>> {
        self.by_id.get(id).map(|r| Arc::clone(&r.value().1))
    }

    /// Current events in first-seen order (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<TimelineEvent>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn insert_quiet(&self, event: TimelineEvent) -> bool {
        match self.by_id.entry(event.id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().1 = Arc::new(event);
                false
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert((seq, Arc::new(event)));
                true
            }
        }
    }

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(u64, Arc<TimelineEvent>)> = self
            .by_id
            .iter()
            .map(|r| (r.value().0, Arc::clone(&r.value().1)))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        let values = entries.into_iter().map(|(_, e)| e).collect();
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
