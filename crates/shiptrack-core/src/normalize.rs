// ── Raw-to-domain normalization ──
//
// Bridges heterogeneous JSON (carrier tracking payloads, stored lifecycle
// documents) into canonical `TimelineEvent`s. Every helper is total: a
// missing or malformed field gets a deterministic default, and one bad
// record never stops the rest of a list from being normalized.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{EventOrigin, EventType, Location, StatusChange, TimelineEvent, UserData};

/// Epoch values below this are seconds, at or above it milliseconds.
/// (1e11 seconds is the year 5138; 1e11 milliseconds is March 1973.)
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

// ── Timestamps ─────────────────────────────────────────────────────

fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.abs() < EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp(epoch, 0)
    } else {
        DateTime::from_timestamp_millis(epoch)
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    raw.parse::<i64>().ok().and_then(epoch_to_datetime)
}

/// Stored-document timestamp: `{seconds, nanoseconds}` or the underscored
/// admin-SDK form `{_seconds, _nanoseconds}`.
fn parse_timestamp_object(obj: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let seconds = obj
        .get("seconds")
        .or_else(|| obj.get("_seconds"))
        .and_then(Value::as_i64)?;
    let nanos = obj
        .get("nanoseconds")
        .or_else(|| obj.get("_nanoseconds"))
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    DateTime::from_timestamp(seconds, nanos)
}

/// Parse any supported timestamp representation into a canonical instant.
///
/// Accepts ISO-8601 / RFC 3339 strings, stored-document timestamp objects,
/// and epoch numbers (seconds or milliseconds). Returns `None` when the
/// value cannot be understood.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n.as_i64().or_else(|| float_to_epoch(n.as_f64()?)).and_then(epoch_to_datetime),
        Value::Object(obj) => parse_timestamp_object(obj),
        _ => None,
    }
}

#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
fn float_to_epoch(f: f64) -> Option<i64> {
    (f.is_finite() && f.abs() < 9.0e15).then(|| f.round() as i64)
}

/// Resolve a timestamp or fall back to `now`, logging the substitution.
fn timestamp_or(value: Option<&Value>, now: DateTime<Utc>, record_id: &str) -> DateTime<Utc> {
    match value.and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            warn!(record = record_id, raw = ?value, "unparseable event timestamp, using now");
            now
        }
    }
}

// ── Field helpers ──────────────────────────────────────────────────

fn str_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn value_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Structured location from an object or a free-form `"City, ST"` string.
pub fn parse_location(value: &Value) -> Option<Location> {
    let location = match value {
        Value::Object(obj) => Location {
            city: str_field(obj, &["city"]).unwrap_or_default().to_owned(),
            state: str_field(obj, &["state", "stateProvince", "region"])
                .unwrap_or_default()
                .to_owned(),
            postal_code: str_field(obj, &["postalCode", "postal_code", "zip", "zipCode"])
                .unwrap_or_default()
                .to_owned(),
        },
        Value::String(s) => {
            let mut parts = s.splitn(2, ',').map(str::trim);
            Location {
                city: parts.next().unwrap_or_default().to_owned(),
                state: parts.next().unwrap_or_default().to_owned(),
                postal_code: String::new(),
            }
        }
        _ => return None,
    };
    (!location.is_empty()).then_some(location)
}

fn parse_user_data(value: &Value) -> Option<UserData> {
    let obj = value.as_object()?;
    let data = UserData {
        email: str_field(obj, &["email"]).map(str::to_owned),
        user_id: str_field(obj, &["userId", "uid"]).map(str::to_owned),
        user_name: str_field(obj, &["userName", "displayName", "name"]).map(str::to_owned),
    };
    (!data.is_empty()).then_some(data)
}

fn parse_status_change(value: &Value) -> Option<StatusChange> {
    let obj = value.as_object()?;
    let change = StatusChange {
        from: str_field(obj, &["from"]).map(str::to_owned),
        to: str_field(obj, &["to"]).map(str::to_owned),
        reason: str_field(obj, &["reason"]).map(str::to_owned),
    };
    (change.from.is_some() || change.to.is_some()).then_some(change)
}

/// Human label for a status code: `"in_transit"` → `"In Transit"`.
fn humanize(code: &str) -> String {
    code.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tracking records ───────────────────────────────────────────────

/// Tracking record list inside a status-check `carrierData` payload.
///
/// Carriers disagree on the key, so `trackingEvents`, `events`, and
/// `activities` are all accepted.
pub fn tracking_records(carrier_data: &Value) -> &[Value] {
    ["trackingEvents", "events", "activities"]
        .iter()
        .find_map(|k| carrier_data.get(*k).and_then(Value::as_array))
        .map_or(&[], Vec::as_slice)
}

/// Carrier name inside a `carrierData` payload, if any.
pub fn carrier_name(carrier_data: &Value) -> Option<&str> {
    carrier_data.as_object().and_then(|obj| str_field(obj, &["carrier", "carrierName"]))
}

/// Normalize one carrier tracking record.
///
/// `index` makes the synthetic id of id-less records unique within one
/// payload; `now` substitutes for a missing timestamp.
pub fn normalize_tracking_event(
    record: &Value,
    index: usize,
    carrier: Option<&str>,
    now: DateTime<Utc>,
) -> TimelineEvent {
    let empty = Map::new();
    let obj = record.as_object().unwrap_or(&empty);

    let raw_ts = value_field(obj, &["timestamp", "date", "datetime", "time", "occurredAt"]);
    let parsed_ts = raw_ts.and_then(parse_timestamp);

    let id = str_field(obj, &["id", "eventId"]).map_or_else(
        || format!("tracking-{index}-{}", parsed_ts.unwrap_or(now).timestamp_millis()),
        str::to_owned,
    );
    let timestamp = parsed_ts.unwrap_or_else(|| timestamp_or(raw_ts, now, &id));

    let status = str_field(obj, &["status", "title", "statusCode"])
        .map_or_else(|| "Unknown".to_owned(), str::to_owned);
    let description = str_field(obj, &["description", "message", "statusDescription"])
        .unwrap_or_default()
        .to_owned();

    TimelineEvent {
        id,
        status,
        description,
        location: value_field(obj, &["location", "address"]).and_then(parse_location),
        timestamp,
        event_type: EventType::TrackingUpdate,
        source: EventOrigin::Carrier,
        source_carrier: str_field(obj, &["carrier"])
            .or(carrier)
            .map(str::to_owned),
        user_data: None,
        status_change: None,
    }
}

/// Normalize a list of carrier tracking records, preserving order.
pub fn normalize_tracking_values(
    records: &[Value],
    carrier: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<TimelineEvent> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| normalize_tracking_event(r, i, carrier, now))
        .collect()
}

// ── Lifecycle documents ────────────────────────────────────────────

/// Normalize one stored lifecycle document.
///
/// Returns `None` only when the document is not a JSON object at all.
/// Unknown `eventType` strings become `status_update`; unknown `source`
/// strings become `system`.
pub fn normalize_lifecycle_event(
    value: &Value,
    index: usize,
    now: DateTime<Utc>,
) -> Option<TimelineEvent> {
    let obj = value.as_object()?;

    let raw_ts = value_field(obj, &["timestamp", "createdAt", "date"]);
    let parsed_ts = raw_ts.and_then(parse_timestamp);

    let id = str_field(obj, &["id", "eventId"]).map_or_else(
        || format!("event-{index}-{}", parsed_ts.unwrap_or(now).timestamp_millis()),
        str::to_owned,
    );
    let timestamp = parsed_ts.unwrap_or_else(|| timestamp_or(raw_ts, now, &id));

    let event_type = str_field(obj, &["eventType", "type"])
        .and_then(|t| t.parse::<EventType>().ok())
        .unwrap_or(EventType::StatusUpdate);

    let status = str_field(obj, &["title", "status"])
        .map_or_else(|| humanize(event_type.as_ref()), str::to_owned);

    let source = str_field(obj, &["source"])
        .and_then(|s| s.parse::<EventOrigin>().ok())
        .unwrap_or_default();

    Some(TimelineEvent {
        id,
        status,
        description: str_field(obj, &["description", "message"])
            .unwrap_or_default()
            .to_owned(),
        location: obj.get("location").and_then(parse_location),
        timestamp,
        event_type,
        source,
        source_carrier: str_field(obj, &["sourceCarrier", "carrier"]).map(str::to_owned),
        user_data: obj.get("userData").and_then(parse_user_data),
        status_change: obj.get("statusChange").and_then(parse_status_change),
    })
}

/// Normalize a stored event list, skipping (and logging) non-object entries.
pub fn normalize_lifecycle_values(values: &[Value], now: DateTime<Utc>) -> Vec<TimelineEvent> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let event = normalize_lifecycle_event(v, i, now);
            if event.is_none() {
                warn!(index = i, "skipping malformed lifecycle event (not an object)");
            }
            event
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn jan1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    // ── Timestamps ──

    #[test]
    fn parses_every_timestamp_shape() {
        let expected = Some(jan1());
        assert_eq!(parse_timestamp(&json!("2024-01-01T00:00:00Z")), expected);
        assert_eq!(parse_timestamp(&json!("2024-01-01T01:00:00+01:00")), expected);
        assert_eq!(parse_timestamp(&json!("2024-01-01 00:00:00")), expected);
        assert_eq!(parse_timestamp(&json!("2024-01-01")), expected);
        assert_eq!(parse_timestamp(&json!(1_704_067_200)), expected);
        assert_eq!(parse_timestamp(&json!(1_704_067_200_000_i64)), expected);
        assert_eq!(parse_timestamp(&json!(1_704_067_200_000.0)), expected);
        assert_eq!(parse_timestamp(&json!("1704067200000")), expected);
        assert_eq!(
            parse_timestamp(&json!({ "seconds": 1_704_067_200, "nanoseconds": 0 })),
            expected
        );
        assert_eq!(
            parse_timestamp(&json!({ "_seconds": 1_704_067_200, "_nanoseconds": 0 })),
            expected
        );
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert_eq!(parse_timestamp(&json!("not a date")), None);
        assert_eq!(parse_timestamp(&json!(null)), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp(&json!({ "nanoseconds": 5 })), None);
    }

    // ── Tracking ──

    #[test]
    fn tracking_record_normalizes_fully() {
        let record = json!({
            "id": "ups-1",
            "status": "In Transit",
            "description": "Departed facility",
            "location": { "city": "Louisville", "state": "KY", "postalCode": "40209" },
            "timestamp": "2024-01-01T00:00:00Z"
        });
        let event = normalize_tracking_event(&record, 0, Some("UPS"), now());

        assert_eq!(event.id, "ups-1");
        assert_eq!(event.status, "In Transit");
        assert_eq!(event.timestamp, jan1());
        assert_eq!(event.event_type, EventType::TrackingUpdate);
        assert_eq!(event.source, EventOrigin::Carrier);
        assert_eq!(event.source_carrier.as_deref(), Some("UPS"));
        assert_eq!(event.location.as_ref().unwrap().label(), "Louisville, KY 40209");
        assert_eq!(event.display().icon, "truck");
    }

    #[test]
    fn tracking_record_missing_timestamp_falls_back_to_now() {
        let event = normalize_tracking_event(&json!({ "status": "Delivered" }), 3, None, now());
        assert_eq!(event.timestamp, now());
        assert_eq!(event.id, format!("tracking-3-{}", now().timestamp_millis()));
    }

    #[test]
    fn tracking_record_bad_timestamp_falls_back_to_now() {
        let event =
            normalize_tracking_event(&json!({ "status": "x", "timestamp": "soon" }), 0, None, now());
        assert_eq!(event.timestamp, now());
    }

    #[test]
    fn tracking_record_missing_location_parts_are_empty() {
        let event = normalize_tracking_event(
            &json!({ "status": "Arrived", "location": { "city": "Reno" } }),
            0,
            None,
            now(),
        );
        let loc = event.location.unwrap();
        assert_eq!(loc.city, "Reno");
        assert_eq!(loc.state, "");
        assert_eq!(loc.postal_code, "");
    }

    #[test]
    fn non_object_tracking_record_still_yields_event() {
        let event = normalize_tracking_event(&json!(42), 0, None, now());
        assert_eq!(event.status, "Unknown");
        assert_eq!(event.display(), crate::model::DisplayStyle::UNKNOWN);
    }

    #[test]
    fn tracking_records_found_under_alternate_keys() {
        let data = json!({ "carrier": "FedEx", "events": [{ "status": "Delivered" }] });
        assert_eq!(tracking_records(&data).len(), 1);
        assert_eq!(carrier_name(&data), Some("FedEx"));
        assert!(tracking_records(&json!({})).is_empty());
    }

    // ── Lifecycle ──

    #[test]
    fn lifecycle_document_normalizes() {
        let doc = json!({
            "id": "evt-9",
            "eventType": "status_update",
            "title": "Status changed",
            "timestamp": { "_seconds": 1_704_067_200, "_nanoseconds": 0 },
            "source": "user",
            "userData": { "email": "a@b.c", "userId": "u1", "userName": "Ada" },
            "statusChange": { "from": "booked", "to": "in_transit", "reason": "manual" }
        });
        let event = normalize_lifecycle_event(&doc, 0, now()).unwrap();

        assert_eq!(event.id, "evt-9");
        assert_eq!(event.status, "Status changed");
        assert_eq!(event.timestamp, jan1());
        assert_eq!(event.source, EventOrigin::User);
        assert_eq!(event.user_data.unwrap().user_name.as_deref(), Some("Ada"));
        assert_eq!(event.status_change.unwrap().to.as_deref(), Some("in_transit"));
    }

    #[test]
    fn lifecycle_unknown_vocabulary_defaults() {
        let doc = json!({ "eventType": "teleport", "source": "aliens", "timestamp": 0 });
        let event = normalize_lifecycle_event(&doc, 1, now()).unwrap();
        assert_eq!(event.event_type, EventType::StatusUpdate);
        assert_eq!(event.source, EventOrigin::System);
        assert_eq!(event.status, "Status Update");
    }

    #[test]
    fn malformed_entry_does_not_abort_the_list() {
        let values = vec![
            json!({ "id": "a", "eventType": "created", "timestamp": "2024-01-01T00:00:00Z" }),
            json!("garbage"),
            json!({ "id": "b", "eventType": "rate_selected", "timestamp": "bad" }),
        ];
        let events = normalize_lifecycle_values(&values, now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "a");
        assert_eq!(events[1].id, "b");
        assert_eq!(events[1].timestamp, now());
    }

    #[test]
    fn humanize_codes() {
        assert_eq!(humanize("booking_confirmed"), "Booking Confirmed");
        assert_eq!(humanize("in-TRANSIT"), "In Transit");
    }
}
