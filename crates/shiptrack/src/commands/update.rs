//! Smart update and forced refresh.

use serde::Serialize;

use shiptrack_core::{Backend, BackendConfig, SmartUpdater, TimelineStore, UpdateResult};

use crate::cli::{GlobalOpts, ShipmentArgs, UpdateArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReport<'a> {
    shipment_id: &'a str,
    message: String,
    #[serde(flatten)]
    result: &'a UpdateResult,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn detail(report: &UpdateReport<'_>) -> String {
    let r = report.result;
    let mut lines = vec![
        format!("Shipment:  {}", report.shipment_id),
        format!("Outcome:   {}", report.message),
        format!("Success:   {}", yes_no(r.success)),
        format!("Skipped:   {}", yes_no(r.skipped)),
        format!("Forced:    {}", yes_no(r.forced)),
    ];
    if r.status_changed {
        lines.push(format!(
            "Status:    {} -> {}",
            r.previous_status.as_deref().unwrap_or("-"),
            r.new_status.as_deref().unwrap_or("-")
        ));
    }
    if r.tracking_updates_count > 0 {
        lines.push(format!("Tracking:  {} new", r.tracking_updates_count));
    }
    if let Some(ref reason) = r.reason {
        lines.push(format!("Reason:    {reason}"));
    }
    lines.push(format!("At:        {}", util::format_time(r.timestamp)));
    lines.join("\n")
}

fn report(
    shipment_id: &str,
    updater: &SmartUpdater<Backend>,
    result: Option<UpdateResult>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let Some(result) = result else {
        return Err(CliError::MissingShipmentId);
    };
    let message = updater.status_message().unwrap_or_default();
    let view = UpdateReport {
        shipment_id,
        message: message.clone(),
        result: &result,
    };
    let out = output::render_single(global.output, &view, detail, |v| v.message.clone())?;
    output::print_output(&out, global.quiet);

    if result.success {
        Ok(())
    } else {
        Err(CliError::UpdateFailed { message })
    }
}

pub async fn handle_update(
    config: BackendConfig,
    args: &UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let shipment = util::read_shipment(&args.shipment.file)?;
    util::require_id(&shipment)?;

    let policy = config.policy;
    let updater = SmartUpdater::new(Backend::new(config), TimelineStore::new(), policy);
    let result = updater.perform_smart_update(&shipment, args.force).await;
    report(&shipment.id, &updater, result, global)
}

pub async fn handle_refresh(
    config: BackendConfig,
    args: &ShipmentArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let shipment = util::read_shipment(&args.file)?;
    util::require_id(&shipment)?;

    let policy = config.policy;
    let updater = SmartUpdater::new(Backend::new(config), TimelineStore::new(), policy);
    let result = updater.force_refresh(&shipment).await;
    report(&shipment.id, &updater, result, global)
}
