//! Offline selected-rate resolution.

use shiptrack_core::{ResolvedRate, resolve_rate};

use crate::cli::{GlobalOpts, ShipmentArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn amount(rate: &ResolvedRate) -> String {
    rate.amount
        .map_or_else(|| "-".into(), |a| format!("{a:.2} {}", rate.currency))
}

fn detail(rate: &ResolvedRate) -> String {
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_owned();
    [
        format!("Rate:     {}", or_dash(rate.id.as_deref())),
        format!("Carrier:  {}", or_dash(rate.carrier.as_deref())),
        format!("Service:  {}", or_dash(rate.service.as_deref())),
        format!("Amount:   {}", amount(rate)),
        format!(
            "Transit:  {}",
            rate.transit_days
                .map_or_else(|| "-".into(), |d| format!("{d} days"))
        ),
        format!("From:     {}", rate.origin),
    ]
    .join("\n")
}

pub fn handle(args: &ShipmentArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let shipment = util::read_shipment(&args.file)?;

    let Some(rate) = resolve_rate(&shipment.rates) else {
        if !global.quiet {
            eprintln!("No rate selected for shipment '{}'", shipment.id);
        }
        return Ok(());
    };

    let out = output::render_single(global.output, &rate, detail, amount)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
