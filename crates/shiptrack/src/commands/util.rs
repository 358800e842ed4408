//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tabled::Tabled;

use shiptrack_core::{Shipment, TimelineEvent};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Input ───────────────────────────────────────────────────────────

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    Ok(serde_json::from_str(&read_input(path)?)?)
}

pub fn read_shipment(path: &Path) -> Result<Shipment, CliError> {
    Ok(serde_json::from_str(&read_input(path)?)?)
}

/// A bare array, or an object with a `shipments` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ShipmentList {
    Bare(Vec<Shipment>),
    Wrapped { shipments: Vec<Shipment> },
}

pub fn read_shipments(path: &Path) -> Result<Vec<Shipment>, CliError> {
    let list: ShipmentList = serde_json::from_str(&read_input(path)?)?;
    Ok(match list {
        ShipmentList::Bare(shipments) | ShipmentList::Wrapped { shipments } => shipments,
    })
}

pub fn require_id(shipment: &Shipment) -> Result<(), CliError> {
    if shipment.id.is_empty() {
        return Err(CliError::MissingShipmentId);
    }
    Ok(())
}

// ── Formatting ──────────────────────────────────────────────────────

pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn format_duration(d: Duration) -> String {
    humantime::format_duration(d).to_string()
}

// ── Timeline rendering ──────────────────────────────────────────────

#[derive(Tabled)]
struct TimelineRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn source_label(event: &TimelineEvent) -> String {
    match event.source_carrier {
        Some(ref carrier) => format!("{} ({carrier})", event.source),
        None => event.source.to_string(),
    }
}

/// One line per event, for plain output and live feeds.
pub fn timeline_line(event: &TimelineEvent, color: bool) -> String {
    let mut line = format!(
        "{}  {}",
        format_time(event.timestamp),
        output::paint(&event.status, event.display(), color)
    );
    if let Some(location) = event.location.as_ref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(" @ {}", location.label()));
    }
    if !event.description.is_empty() {
        line.push_str(&format!(" - {}", event.description));
    }
    line
}

pub fn render_timeline(global: &GlobalOpts, events: &[TimelineEvent]) -> Result<String, CliError> {
    let color = output::should_color(global.color);
    output::render_list(
        global.output,
        events,
        |e| TimelineRow {
            time: format_time(e.timestamp),
            status: output::paint(&e.status, e.display(), color),
            event_type: e.event_type.to_string(),
            location: e.location.as_ref().map(|l| l.label()).unwrap_or_default(),
            source: source_label(e),
            description: e.description.clone(),
        },
        |e| timeline_line(e, false),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn shipments_read_bare_or_wrapped() {
        let mut bare = tempfile::NamedTempFile::new().unwrap();
        write!(bare, r#"[{{"id":"A","status":"booked"}},{{"id":"B"}}]"#).unwrap();
        let list = read_shipments(bare.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id, "B");

        let mut wrapped = tempfile::NamedTempFile::new().unwrap();
        write!(wrapped, r#"{{"shipments":[{{"id":"C","status":"in_transit"}}]}}"#).unwrap();
        let list = read_shipments(wrapped.path()).unwrap();
        assert_eq!(list[0].id, "C");
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = require_id(&Shipment::default()).unwrap_err();
        assert!(matches!(err, CliError::MissingShipmentId));
    }
}
