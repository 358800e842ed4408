// ── Shipment record ──
//
// The caller supplies the shipment; nothing in this crate fetches it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::normalize::parse_timestamp;
use crate::rates::RateFields;

/// Lifecycle status of a shipment.
///
/// Parsing is lenient: case, hyphens and spaces are ignored and anything
/// unrecognized becomes [`ShipmentStatus::Unknown`].
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
    EnumIter,
    AsRefStr,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum ShipmentStatus {
    Draft,
    Pending,
    Created,
    Scheduled,
    Booked,
    AwaitingShipment,
    InTransit,
    Delivered,
    OnHold,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
    Void,
    #[default]
    Unknown,
}

/// Polling class of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StatusTier {
    /// Nothing left to learn from the carrier.
    Final,
    /// Moving; check often.
    ActiveTransit,
    /// Booked but not yet moving.
    PreTransit,
    Other,
}

impl ShipmentStatus {
    pub fn parse_lenient(raw: &str) -> Self {
        let key = raw.trim().to_lowercase().replace(['-', ' '], "_");
        key.parse().unwrap_or(Self::Unknown)
    }

    pub fn tier(self) -> StatusTier {
        match self {
            Self::Delivered | Self::Cancelled | Self::Void => StatusTier::Final,
            Self::InTransit | Self::Scheduled => StatusTier::ActiveTransit,
            Self::Booked | Self::Pending | Self::AwaitingShipment => StatusTier::PreTransit,
            Self::Draft | Self::Created | Self::OnHold | Self::Unknown => StatusTier::Other,
        }
    }

    pub fn is_final(self) -> bool {
        self.tier() == StatusTier::Final
    }
}

impl From<String> for ShipmentStatus {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

impl From<ShipmentStatus> for String {
    fn from(status: ShipmentStatus) -> Self {
        status.to_string()
    }
}

/// Deserialize any supported timestamp representation; garbage becomes `None`.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp))
}

/// The subset of a shipment document the timeline and policy need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: ShipmentStatus,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub status_last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by_email: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(flatten)]
    pub rates: RateFields,
}

impl Shipment {
    pub fn new(id: impl Into<String>, status: ShipmentStatus) -> Self {
        Self {
            id: id.into(),
            status,
            ..Self::default()
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_status_last_checked(mut self, checked: DateTime<Utc>) -> Self {
        self.status_last_checked = Some(checked);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn lenient_parsing() {
        assert_eq!(ShipmentStatus::parse_lenient("In Transit"), ShipmentStatus::InTransit);
        assert_eq!(
            ShipmentStatus::parse_lenient("awaiting-shipment"),
            ShipmentStatus::AwaitingShipment
        );
        assert_eq!(ShipmentStatus::parse_lenient("CANCELED"), ShipmentStatus::Cancelled);
        assert_eq!(ShipmentStatus::parse_lenient("lost at sea"), ShipmentStatus::Unknown);
    }

    #[test]
    fn every_status_round_trips_through_its_name() {
        for status in ShipmentStatus::iter() {
            assert_eq!(ShipmentStatus::parse_lenient(status.as_ref()), status);
        }
    }

    #[test]
    fn tiers() {
        for s in [ShipmentStatus::Delivered, ShipmentStatus::Cancelled, ShipmentStatus::Void] {
            assert_eq!(s.tier(), StatusTier::Final);
        }
        assert_eq!(ShipmentStatus::Scheduled.tier(), StatusTier::ActiveTransit);
        assert_eq!(ShipmentStatus::AwaitingShipment.tier(), StatusTier::PreTransit);
        assert_eq!(ShipmentStatus::Draft.tier(), StatusTier::Other);
    }

    #[test]
    fn deserializes_mixed_timestamp_shapes() {
        let shipment: Shipment = serde_json::from_value(json!({
            "id": "SHP-1",
            "status": "in_transit",
            "createdAt": { "_seconds": 1_704_067_200, "_nanoseconds": 0 },
            "statusLastChecked": "2024-01-02T00:00:00Z",
            "createdByEmail": "ops@example.com"
        }))
        .unwrap();

        assert_eq!(shipment.status, ShipmentStatus::InTransit);
        assert_eq!(
            shipment.created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            shipment.status_last_checked,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(shipment.created_by_email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn unparseable_timestamp_is_none() {
        let shipment: Shipment =
            serde_json::from_value(json!({ "id": "X", "createdAt": "yesterday-ish" })).unwrap();
        assert!(shipment.created_at.is_none());
        assert_eq!(shipment.status, ShipmentStatus::Unknown);
    }
}
