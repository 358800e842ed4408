// ── Timeline merger ──
//
// Combines normalized carrier tracking events and recorded lifecycle
// events into one descending-time sequence. Inputs are treated as
// immutable snapshots; the output is a fresh `Vec`.

use tracing::debug;

use crate::model::{EventOrigin, EventType, Shipment, TimelineEvent, UserData};

/// Synthetic `created` event for a shipment that has a creation time.
///
/// Returns `None` when the shipment has no `created_at`.
pub fn synthetic_created_event(shipment: &Shipment) -> Option<TimelineEvent> {
    let timestamp = shipment.created_at?;

    let user_data = UserData {
        email: shipment.created_by_email.clone(),
        user_id: shipment.created_by.clone(),
        user_name: shipment.created_by_name.clone(),
    };

    Some(TimelineEvent {
        id: format!("synthetic-created-{}", shipment.id),
        status: "Shipment Created".into(),
        description: "Shipment record created".into(),
        location: None,
        timestamp,
        event_type: EventType::Created,
        source: EventOrigin::System,
        source_carrier: None,
        user_data: (!user_data.is_empty()).then_some(user_data),
        status_change: None,
    })
}

/// Merge tracking and lifecycle events into a single timeline.
///
/// Tracking events come first in the concatenation, then lifecycle
/// events, then (only if no creation event exists) a synthetic `created`
/// entry. The result is sorted newest-first; equal timestamps keep their
/// concatenation order. No other deduplication is performed.
pub fn merge_timeline(
    tracking: &[TimelineEvent],
    lifecycle: &[TimelineEvent],
    shipment: &Shipment,
) -> Vec<TimelineEvent> {
    let mut merged: Vec<TimelineEvent> = Vec::with_capacity(tracking.len() + lifecycle.len() + 1);
    merged.extend_from_slice(tracking);
    merged.extend_from_slice(lifecycle);

    if !merged.iter().any(TimelineEvent::is_creation) {
        if let Some(created) = synthetic_created_event(shipment) {
            debug!(shipment = %shipment.id, "adding synthetic created event");
            merged.push(created);
        }
    }

    // `sort_by` is stable, so ties keep their input position.
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}
