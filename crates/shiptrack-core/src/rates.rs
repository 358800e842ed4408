// ── Selected-rate resolution ──
//
// A shipment can carry its chosen rate in several shapes, written by
// different generations of the booking flow. `resolve_rate` picks the
// richest one available and maps it into a single `ResolvedRate`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;

/// Raw rate fields as stored on a shipment document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rate_detailed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rate_ref: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rates: Vec<Value>,
}

/// Which representation a resolved rate came from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RateOrigin {
    Detailed,
    SelectedRate,
    Reference,
    Collection,
}

/// A selected rate in one canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    pub id: Option<String>,
    pub carrier: Option<String>,
    pub service: Option<String>,
    pub amount: Option<f64>,
    pub currency: String,
    pub transit_days: Option<u32>,
    pub origin: RateOrigin,
}

impl ResolvedRate {
    fn from_parts(parts: RateParts, origin: RateOrigin) -> Self {
        Self {
            id: parts.id,
            carrier: parts.carrier,
            service: parts.service,
            amount: parts.amount,
            currency: parts.currency.unwrap_or_else(|| "USD".into()),
            transit_days: parts.transit_days,
            origin,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct RateParts {
    id: Option<String>,
    carrier: Option<String>,
    service: Option<String>,
    amount: Option<f64>,
    currency: Option<String>,
    transit_days: Option<u32>,
}

impl RateParts {
    fn is_empty(&self) -> bool {
        self.carrier.is_none() && self.service.is_none() && self.amount.is_none()
    }

    /// Fill gaps in `self` from `other`.
    fn merge(self, other: Self) -> Self {
        Self {
            id: self.id.or(other.id),
            carrier: self.carrier.or(other.carrier),
            service: self.service.or(other.service),
            amount: self.amount.or(other.amount),
            currency: self.currency.or(other.currency),
            transit_days: self.transit_days.or(other.transit_days),
        }
    }
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        Value::Object(obj) => obj.get("amount").and_then(number),
        _ => None,
    }
}

fn first_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(number)
}

/// Parse one rate object in either the nested "universal" form or the
/// legacy flat form.
fn parse_parts(value: &Value) -> RateParts {
    let Some(obj) = value.as_object() else {
        return RateParts::default();
    };

    let flat = RateParts {
        id: text(obj, &["id", "rateId", "objectId"]),
        carrier: text(obj, &["carrier", "carrierName", "provider"]),
        service: text(obj, &["service", "serviceName", "serviceLevel", "servicelevel"]),
        amount: first_number(obj, &["amount", "totalCharge", "total", "price", "rate"]),
        currency: text(obj, &["currency", "currencyCode"]),
        transit_days: obj
            .get("transitDays")
            .or_else(|| obj.get("estimatedDays"))
            .and_then(number)
            .and_then(days_from_f64),
    };

    match obj.get("universal") {
        Some(nested @ Value::Object(_)) => parse_parts(nested).merge(flat),
        _ => flat,
    }
}

#[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn days_from_f64(days: f64) -> Option<u32> {
    (days.is_finite() && (0.0..=365.0).contains(&days)).then(|| days.round() as u32)
}

/// Resolve the selected rate, trying each representation in priority order:
/// detailed info, the stored selected rate (gaps filled from the reference),
/// the reference alone, then the rate collection (the entry matching the
/// reference id, else the cheapest).
pub fn resolve_rate(fields: &RateFields) -> Option<ResolvedRate> {
    let reference = fields.selected_rate_ref.as_ref().map(parse_parts);

    if let Some(detailed) = fields.selected_rate_detailed.as_ref().map(parse_parts) {
        if !detailed.is_empty() {
            return Some(ResolvedRate::from_parts(detailed, RateOrigin::Detailed));
        }
    }

    if let Some(selected) = fields.selected_rate.as_ref().map(parse_parts) {
        let merged = match reference.clone() {
            Some(r) => selected.merge(r),
            None => selected,
        };
        if !merged.is_empty() {
            return Some(ResolvedRate::from_parts(merged, RateOrigin::SelectedRate));
        }
    }

    if let Some(reference) = reference.clone().filter(|r| !r.is_empty()) {
        return Some(ResolvedRate::from_parts(reference, RateOrigin::Reference));
    }

    let candidates: Vec<RateParts> = fields
        .rates
        .iter()
        .map(parse_parts)
        .filter(|p| !p.is_empty())
        .collect();

    let ref_id = reference.and_then(|r| r.id);
    let by_id = ref_id
        .as_deref()
        .and_then(|id| candidates.iter().find(|c| c.id.as_deref() == Some(id)));

    by_id
        .or_else(|| {
            candidates
                .iter()
                .filter(|c| c.amount.is_some())
                .min_by(|a, b| a.amount.unwrap_or(f64::MAX).total_cmp(&b.amount.unwrap_or(f64::MAX)))
        })
        .cloned()
        .map(|parts| ResolvedRate::from_parts(parts, RateOrigin::Collection))
}
