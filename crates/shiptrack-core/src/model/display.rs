// ── Display lookup ──
//
// Fixed table from event type / carrier status to a color token and an
// icon class. Recomputed on every render; nothing here is persisted.

use serde::Serialize;

use super::event::EventType;

/// Color token and icon class for one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayStyle {
    pub color: &'static str,
    pub icon: &'static str,
}

impl DisplayStyle {
    const fn new(color: &'static str, icon: &'static str) -> Self {
        Self { color, icon }
    }

    /// Fallback for statuses the table does not know.
    pub const UNKNOWN: Self = Self::new("gray", "help-circle");
}

/// Look up the style of a carrier status string (case-insensitive).
pub fn style_for_status(status: &str) -> DisplayStyle {
    let key = status.trim().to_lowercase().replace(['-', ' '], "_");
    match key.as_str() {
        "delivered" => DisplayStyle::new("green", "check-circle"),
        "out_for_delivery" => DisplayStyle::new("indigo", "truck-fast"),
        "in_transit" | "transit" | "departed" | "arrived" => DisplayStyle::new("blue", "truck"),
        "picked_up" | "pickup" | "accepted" => DisplayStyle::new("cyan", "box"),
        "pending" | "pre_transit" | "label_created" | "created" | "booked" | "scheduled" => {
            DisplayStyle::new("gray", "clock")
        }
        "awaiting_shipment" => DisplayStyle::new("gray", "hourglass"),
        "on_hold" | "held" => DisplayStyle::new("amber", "pause-circle"),
        "exception" | "failed" | "delivery_failed" | "failure" => {
            DisplayStyle::new("red", "alert-triangle")
        }
        "returned" | "return_to_sender" => DisplayStyle::new("orange", "corner-up-left"),
        "cancelled" | "canceled" | "void" => DisplayStyle::new("red", "x-circle"),
        _ => DisplayStyle::UNKNOWN,
    }
}

/// Style of an event: lifecycle types have fixed styles, tracking-ish
/// types defer to their status text.
pub fn style_for_event(event_type: EventType, status: &str) -> DisplayStyle {
    match event_type {
        EventType::Created => DisplayStyle::new("gray", "plus-circle"),
        EventType::Confirmation | EventType::BookingConfirmed => {
            DisplayStyle::new("green", "check-square")
        }
        EventType::Error => DisplayStyle::new("red", "alert-circle"),
        EventType::UserAction => DisplayStyle::new("slate", "user"),
        EventType::DocumentGenerated => DisplayStyle::new("purple", "file-text"),
        EventType::RateSelected => DisplayStyle::new("teal", "tag"),
        EventType::StatusUpdate | EventType::TrackingUpdate | EventType::CarrierUpdate => {
            style_for_status(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lookup_is_case_and_separator_insensitive() {
        assert_eq!(style_for_status("DELIVERED").color, "green");
        assert_eq!(style_for_status("In Transit").icon, "truck");
        assert_eq!(style_for_status("out-for-delivery").icon, "truck-fast");
    }

    #[test]
    fn unknown_status_falls_back() {
        assert_eq!(style_for_status("teleported"), DisplayStyle::UNKNOWN);
        assert_eq!(style_for_status(""), DisplayStyle::UNKNOWN);
    }

    #[test]
    fn lifecycle_types_ignore_status_text() {
        assert_eq!(
            style_for_event(EventType::DocumentGenerated, "delivered").icon,
            "file-text"
        );
        assert_eq!(
            style_for_event(EventType::TrackingUpdate, "delivered").icon,
            "check-circle"
        );
    }
}
