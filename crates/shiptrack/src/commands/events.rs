//! Stored lifecycle events.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shiptrack_core::normalize::normalize_lifecycle_event;
use shiptrack_core::{
    Backend, BackendConfig, EventFeed, EventOrigin, EventType, TimelineEvent, TimelineStore,
};

use crate::cli::{EventsArgs, EventsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn parse_key<T: FromStr>(field: &str, raw: &str, valid: &str) -> Result<T, CliError> {
    raw.trim()
        .replace('-', "_")
        .parse()
        .map_err(|_| CliError::Validation {
            field: field.into(),
            reason: format!("unknown {field} '{raw}'. Valid values: {valid}"),
        })
}

fn build_event(
    event_type: &str,
    title: Option<String>,
    description: String,
    source: &str,
) -> Result<TimelineEvent, CliError> {
    let event_type: EventType = parse_key(
        "type",
        event_type,
        "created, status_update, tracking_update, confirmation, error, user_action, \
         carrier_update, document_generated, rate_selected, booking_confirmed",
    )?;
    let source: EventOrigin = parse_key("source", source, "system, carrier, user, api")?;
    let status = title.ok_or_else(|| CliError::Validation {
        field: "title".into(),
        reason: "required unless --from-file is given".into(),
    })?;

    Ok(TimelineEvent {
        id: format!("event-{}", Uuid::new_v4()),
        status,
        description,
        location: None,
        timestamp: Utc::now(),
        event_type,
        source,
        source_carrier: None,
        user_data: None,
        status_change: None,
    })
}

pub async fn handle(
    config: BackendConfig,
    args: EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let poll_interval = config.subscription_poll_interval;
    let feed = EventFeed::new(
        Arc::new(Backend::new(config)),
        TimelineStore::new(),
        poll_interval,
    );

    match args.command {
        EventsCommand::List { shipment_id } => {
            let mut events = feed.load(&shipment_id).await?;
            events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            let out = util::render_timeline(global, &events)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Append {
            shipment_id,
            event_type,
            title,
            description,
            source,
            from_file,
        } => {
            let event = match from_file {
                Some(path) => {
                    let value = util::read_json_file(&path)?;
                    normalize_lifecycle_event(&value, 0, Utc::now()).ok_or_else(|| {
                        CliError::Validation {
                            field: "from-file".into(),
                            reason: "event file must hold a JSON object".into(),
                        }
                    })?
                }
                None => build_event(&event_type, title, description, &source)?,
            };

            if !feed.record(&shipment_id, event.clone()).await? {
                return Err(CliError::AppendDeclined { shipment_id });
            }

            let color = output::should_color(global.color);
            let out = output::render_single(
                global.output,
                &event,
                |e| util::timeline_line(e, color),
                |e| e.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
