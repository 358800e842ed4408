//! Live timeline feed.
//!
//! Subscribes to the shipment's event list and prints entries as they
//! appear. With `--auto-update`, also runs the smart update at the
//! policy's recommended cadence and folds the outcome back into the
//! local shipment record.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::time::{Interval, MissedTickBehavior};

use shiptrack_core::{
    Backend, BackendConfig, EventFeed, Shipment, ShipmentStatus, SmartUpdater, TimelineEvent,
    TimelineStore, UpdatePolicy, UpdateResult,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
    seen: HashSet<String>,
}

impl Printer {
    /// Print events not shown yet, oldest first.
    fn show(&mut self, events: &[TimelineEvent]) -> Result<(), CliError> {
        for event in events.iter().rev() {
            if !self.seen.insert(event.id.clone()) {
                continue;
            }
            let line = match self.format {
                OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
                    serde_json::to_string(event)?
                }
                OutputFormat::Table | OutputFormat::Plain => util::timeline_line(event, self.color),
            };
            output::print_output(&line, self.quiet);
        }
        Ok(())
    }
}

fn check_ticker(policy: &UpdatePolicy, shipment: &Shipment) -> Option<Interval> {
    let period = policy.recommended_check_interval(shipment)?;
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Await `work` unless `stop` resolves first.
async fn unless_stopped<T>(work: impl Future<Output = T>, stop: impl Future) -> Option<T> {
    tokio::select! {
        biased;
        _ = stop => None,
        out = work => Some(out),
    }
}

/// Fold an update outcome into the local shipment record. Returns `true`
/// when the status changed.
fn absorb(shipment: &mut Shipment, result: Option<&UpdateResult>) -> bool {
    let Some(result) = result.filter(|r| r.success && !r.skipped) else {
        return false;
    };
    shipment.status_last_checked = Some(result.timestamp);
    let previous = shipment.status;
    if let Some(ref status) = result.new_status {
        shipment.status = ShipmentStatus::parse_lenient(status);
    }
    previous != shipment.status
}

pub async fn handle(
    config: BackendConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut shipment = util::read_shipment(&args.shipment.file)?;
    util::require_id(&shipment)?;

    let poll_interval = match args.interval {
        Some(ref raw) => config::parse_duration_flag("interval", raw)?,
        None => config.subscription_poll_interval,
    };
    let policy = config.policy;

    let store = TimelineStore::new();
    store.track(&shipment);

    let updater = args
        .auto_update
        .then(|| SmartUpdater::new(Backend::new(config.clone()), store.clone(), policy));
    let mut ticker = if updater.is_some() {
        check_ticker(&policy, &shipment)
    } else {
        None
    };

    let feed = EventFeed::new(Arc::new(Backend::new(config)), store, poll_interval);
    let mut subscription = feed.subscribe(&shipment.id);

    let mut printer = Printer {
        format: global.output,
        color: output::should_color(global.color),
        quiet: global.quiet,
        seen: HashSet::new(),
    };
    printer.show(subscription.timeline().current())?;

    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", shipment.id);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = subscription.timeline().changed() => {
                let Some(events) = changed else { break };
                printer.show(&events)?;
            }
            () = tick(&mut ticker) => {
                if let Some(ref updater) = updater {
                    let update = updater.perform_smart_update(&shipment, false);
                    let Some(result) = unless_stopped(update, &mut ctrl_c).await else {
                        break;
                    };
                    if let Some(message) = updater.status_message() {
                        if !global.quiet {
                            eprintln!("{message}");
                        }
                    }
                    if absorb(&mut shipment, result.as_ref()) {
                        feed.timeline_store().track(&shipment);
                        ticker = check_ticker(&policy, &shipment);
                    }
                }
            }
        }
    }

    subscription.unsubscribe().await;
    if let Some(updater) = updater {
        updater.close();
    }
    Ok(())
}
