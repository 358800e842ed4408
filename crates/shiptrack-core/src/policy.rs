// ── Update policy ──
//
// Decides whether an automatic carrier re-poll is warranted and how often
// a shipment should be checked. Every evaluation takes an explicit `now`;
// nothing is cached between calls.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Shipment, StatusTier};

/// Thresholds for the automatic refresh gate and the polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    /// Shipments younger than this are never auto-updated.
    #[serde(with = "duration_str")]
    pub min_age: Duration,
    /// A check more recent than this suppresses auto-update.
    #[serde(with = "duration_str")]
    pub min_check_spacing: Duration,
    #[serde(with = "duration_str")]
    pub active_transit_interval: Duration,
    #[serde(with = "duration_str")]
    pub default_interval: Duration,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            min_age: Duration::from_secs(2 * 60),
            min_check_spacing: Duration::from_secs(5 * 60),
            active_transit_interval: Duration::from_secs(15 * 60),
            default_interval: Duration::from_secs(30 * 60),
        }
    }
}

/// Why a shipment may or may not be auto-updated right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Eligible,
    FinalStatus { status: String },
    TooNew { age: Duration },
    RecentlyChecked { since: Duration },
}

impl PolicyDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// Reason text, also used for skipped update results.
    pub fn reason(&self) -> String {
        match self {
            Self::Eligible => "eligible for update".into(),
            Self::FinalStatus { status } => format!("shipment is {status}"),
            Self::TooNew { age } => {
                format!("shipment created {} ago", format_minutes(*age))
            }
            Self::RecentlyChecked { since } => {
                format!("status checked {} ago", format_minutes(*since))
            }
        }
    }
}

fn format_minutes(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m", secs / 60)
    }
}

/// Elapsed time from `then` to `now`; future instants count as zero.
fn elapsed(then: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - then).to_std().unwrap_or(Duration::ZERO)
}

impl UpdatePolicy {
    /// Full decision with its reason.
    pub fn evaluate(&self, shipment: &Shipment, now: DateTime<Utc>) -> PolicyDecision {
        if shipment.status.is_final() {
            return PolicyDecision::FinalStatus {
                status: shipment.status.to_string(),
            };
        }

        if let Some(created) = shipment.created_at {
            let age = elapsed(created, now);
            if age < self.min_age {
                return PolicyDecision::TooNew { age };
            }
        }

        if let Some(checked) = shipment.status_last_checked {
            let since = elapsed(checked, now);
            if since < self.min_check_spacing {
                return PolicyDecision::RecentlyChecked { since };
            }
        }

        PolicyDecision::Eligible
    }

    pub fn should_auto_update(&self, shipment: &Shipment, now: DateTime<Utc>) -> bool {
        self.evaluate(shipment, now).is_eligible()
    }

    /// Polling cadence for the shipment's status tier; `None` when final.
    pub fn recommended_check_interval(&self, shipment: &Shipment) -> Option<Duration> {
        match shipment.status.tier() {
            StatusTier::Final => None,
            StatusTier::ActiveTransit => Some(self.active_transit_interval),
            StatusTier::PreTransit | StatusTier::Other => Some(self.default_interval),
        }
    }
}

/// [`UpdatePolicy::should_auto_update`] with default thresholds.
pub fn should_auto_update(shipment: &Shipment, now: DateTime<Utc>) -> bool {
    UpdatePolicy::default().should_auto_update(shipment, now)
}

/// [`UpdatePolicy::recommended_check_interval`] with default thresholds.
pub fn recommended_check_interval(shipment: &Shipment) -> Option<Duration> {
    UpdatePolicy::default().recommended_check_interval(shipment)
}

/// Durations as humantime strings ("5m", "1h 30m").
pub(crate) mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ShipmentStatus;
    use chrono::TimeDelta;
    use strum::IntoEnumIterator;

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn shipment(status: ShipmentStatus, age: TimeDelta) -> Shipment {
        Shipment::new("SHP-1", status).with_created_at(now() - age)
    }

    #[test]
    fn final_statuses_never_auto_update() {
        for status in [ShipmentStatus::Delivered, ShipmentStatus::Cancelled, ShipmentStatus::Void] {
            let s = shipment(status, TimeDelta::days(30))
                .with_status_last_checked(now() - TimeDelta::days(1));
            assert!(!should_auto_update(&s, now()), "{status}");
            assert_eq!(recommended_check_interval(&s), None);
        }
    }

    #[test]
    fn young_shipments_never_auto_update() {
        let s = shipment(ShipmentStatus::InTransit, TimeDelta::seconds(90));
        let decision = UpdatePolicy::default().evaluate(&s, now());
        assert!(matches!(decision, PolicyDecision::TooNew { .. }));
        assert_eq!(decision.reason(), "shipment created 1m ago");
    }

    #[test]
    fn recent_check_suppresses_update() {
        let s = shipment(ShipmentStatus::Booked, TimeDelta::days(2))
            .with_status_last_checked(now() - TimeDelta::minutes(4));
        assert!(!should_auto_update(&s, now()));

        let s = s.with_status_last_checked(now() - TimeDelta::minutes(5));
        assert!(should_auto_update(&s, now()));
    }

    #[test]
    fn missing_created_at_skips_the_age_rule() {
        let s = Shipment::new("SHP-2", ShipmentStatus::Pending);
        assert!(should_auto_update(&s, now()));
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let s = shipment(ShipmentStatus::InTransit, TimeDelta::minutes(-10));
        assert!(!should_auto_update(&s, now()));
    }

    #[test]
    fn interval_is_none_only_for_final() {
        for status in ShipmentStatus::iter() {
            let s = Shipment::new("X", status);
            let interval = recommended_check_interval(&s);
            match status {
                ShipmentStatus::Delivered | ShipmentStatus::Cancelled | ShipmentStatus::Void => {
                    assert_eq!(interval, None);
                }
                ShipmentStatus::InTransit | ShipmentStatus::Scheduled => {
                    assert_eq!(interval, Some(Duration::from_secs(900)));
                }
                _ => assert_eq!(interval, Some(Duration::from_secs(1800)), "{status}"),
            }
        }
    }

    #[test]
    fn ten_day_old_in_transit_checked_twenty_minutes_ago() {
        let s = shipment(ShipmentStatus::InTransit, TimeDelta::days(10))
            .with_status_last_checked(now() - TimeDelta::minutes(20));
        assert!(should_auto_update(&s, now()));
        assert_eq!(recommended_check_interval(&s), Some(Duration::from_secs(15 * 60)));
    }

    #[test]
    fn custom_thresholds_round_trip_through_toml_strings() {
        let policy: UpdatePolicy = serde_json::from_value(serde_json::json!({
            "min_age": "1m",
            "min_check_spacing": "10m",
            "active_transit_interval": "5m",
            "default_interval": "1h"
        }))
        .unwrap();
        assert_eq!(policy.default_interval, Duration::from_secs(3600));
        let s = shipment(ShipmentStatus::Booked, TimeDelta::days(1))
            .with_status_last_checked(now() - TimeDelta::minutes(7));
        assert!(!policy.should_auto_update(&s, now()));
    }
}
