//! Merged timeline view.

use std::sync::Arc;

use shiptrack_core::{Backend, BackendConfig, EventFeed, SmartUpdater, TimelineStore};
use tracing::debug;

use crate::cli::{GlobalOpts, TimelineArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    config: BackendConfig,
    args: &TimelineArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let shipment = util::read_shipment(&args.shipment.file)?;
    util::require_id(&shipment)?;

    let store = TimelineStore::new();
    store.track(&shipment);

    if args.refresh {
        let updater = SmartUpdater::new(Backend::new(config.clone()), store.clone(), config.policy);
        updater.perform_smart_update(&shipment, false).await;
        if let Some(message) = updater.status_message() {
            if !global.quiet {
                eprintln!("{message}");
            }
        }
    }

    let poll_interval = config.subscription_poll_interval;
    let feed = EventFeed::new(Arc::new(Backend::new(config)), store.clone(), poll_interval);
    let lifecycle = feed.load(&shipment.id).await?;
    debug!(shipment = %shipment.id, lifecycle = lifecycle.len(), "lifecycle events loaded");

    let mut events = store.timeline(&shipment);
    if let Some(limit) = args.limit {
        events.truncate(limit);
    }

    let out = util::render_timeline(global, &events)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
