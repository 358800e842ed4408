// ── Timeline event domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::display::{DisplayStyle, style_for_event};

/// What kind of thing happened to a shipment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventType {
    Created,
    StatusUpdate,
    TrackingUpdate,
    Confirmation,
    Error,
    UserAction,
    CarrierUpdate,
    DocumentGenerated,
    RateSelected,
    BookingConfirmed,
}

/// Who recorded an event.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventOrigin {
    #[default]
    System,
    Carrier,
    User,
    Api,
}

/// Structured place. Absent parts are empty strings, never `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.city.is_empty() && self.state.is_empty() && self.postal_code.is_empty()
    }

    /// `"Memphis, TN 38118"`, dropping whichever parts are missing.
    pub fn label(&self) -> String {
        let place = [self.city.as_str(), self.state.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        match (place.is_empty(), self.postal_code.is_empty()) {
            (_, true) => place,
            (true, false) => self.postal_code.clone(),
            (false, false) => format!("{place} {}", self.postal_code),
        }
    }
}

/// Attribution for user-initiated events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

impl UserData {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.user_id.is_none() && self.user_name.is_none()
    }
}

/// Status transition carried by `status_update` events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusChange {
    pub from: Option<String>,
    pub to: Option<String>,
    pub reason: Option<String>,
}

/// One normalized entry in a shipment's timeline.
///
/// Built by the normalizer from carrier tracking payloads or stored
/// lifecycle documents. Display attributes are derived on demand via
/// [`TimelineEvent::display`] and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    #[serde(alias = "title")]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(default)]
    pub source: EventOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change: Option<StatusChange>,
}

impl TimelineEvent {
    /// Marks the start of a shipment's history: typed `created`, or a
    /// status mentioning "created" in any case.
    pub fn is_creation(&self) -> bool {
        self.event_type == EventType::Created || self.status.to_lowercase().contains("created")
    }

    /// Color and icon class for rendering.
    pub fn display(&self) -> DisplayStyle {
        style_for_event(self.event_type, &self.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(event_type: EventType, status: &str) -> TimelineEvent {
        TimelineEvent {
            id: "e1".into(),
            status: status.into(),
            description: String::new(),
            location: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            event_type,
            source: EventOrigin::System,
            source_carrier: None,
            user_data: None,
            status_change: None,
        }
    }

    #[test]
    fn creation_detected_by_type_or_status_text() {
        assert!(event(EventType::Created, "Shipment").is_creation());
        assert!(event(EventType::StatusUpdate, "Label CREATED").is_creation());
        assert!(!event(EventType::StatusUpdate, "In transit").is_creation());
    }

    #[test]
    fn event_type_parses_snake_case() {
        assert_eq!(
            "booking_confirmed".parse::<EventType>().unwrap(),
            EventType::BookingConfirmed
        );
        assert_eq!(EventType::DocumentGenerated.to_string(), "document_generated");
        assert!("mystery".parse::<EventType>().is_err());
    }

    #[test]
    fn location_label_skips_missing_parts() {
        let full = Location {
            city: "Memphis".into(),
            state: "TN".into(),
            postal_code: "38118".into(),
        };
        assert_eq!(full.label(), "Memphis, TN 38118");

        let zip_only = Location {
            postal_code: "10001".into(),
            ..Location::default()
        };
        assert_eq!(zip_only.label(), "10001");
        assert!(Location::default().is_empty());
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let json = serde_json::to_value(event(EventType::RateSelected, "Rate selected")).unwrap();
        assert_eq!(json["eventType"], "rate_selected");
        assert_eq!(json["source"], "system");
        assert!(json.get("userData").is_none());
    }
}
