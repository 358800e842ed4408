//! Offline policy explanation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use shiptrack_core::ShipmentStatus;
use shiptrack_core::normalize::parse_timestamp;

use crate::cli::{GlobalOpts, PolicyArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyReport {
    shipment_id: String,
    status: ShipmentStatus,
    tier: String,
    eligible: bool,
    reason: String,
    recommended_interval: Option<String>,
    evaluated_at: DateTime<Utc>,
}

fn detail(r: &PolicyReport) -> String {
    [
        format!("Shipment:     {}", r.shipment_id),
        format!("Status:       {} ({})", r.status, r.tier),
        format!("Auto-update:  {}", if r.eligible { "yes" } else { "no" }),
        format!("Reason:       {}", r.reason),
        format!(
            "Check every:  {}",
            r.recommended_interval.as_deref().unwrap_or("never (final)")
        ),
        format!("Evaluated at: {}", util::format_time(r.evaluated_at)),
    ]
    .join("\n")
}

pub fn handle(args: &PolicyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let shipment = util::read_shipment(&args.shipment.file)?;
    let policy = config::active_policy(global)?;

    let now = match args.at {
        Some(ref raw) => parse_timestamp(&Value::String(raw.clone())).ok_or_else(|| {
            CliError::Validation {
                field: "at".into(),
                reason: format!("not a timestamp: {raw}"),
            }
        })?,
        None => Utc::now(),
    };

    let decision = policy.evaluate(&shipment, now);
    let report = PolicyReport {
        shipment_id: shipment.id.clone(),
        status: shipment.status,
        tier: shipment.status.tier().to_string(),
        eligible: decision.is_eligible(),
        reason: decision.reason(),
        recommended_interval: policy
            .recommended_check_interval(&shipment)
            .map(util::format_duration),
        evaluated_at: now,
    };

    let out = output::render_single(global.output, &report, detail, |r| r.reason.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
