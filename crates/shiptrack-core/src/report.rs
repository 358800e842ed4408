// ── Result reporter ──
//
// Turns the `(loading, error, result)` triple into one short status line.

use crate::model::UpdateResult;

/// Status line for the current update state, or `None` before any attempt.
///
/// Priority: loading > error > skipped > status change > new tracking
/// records > plain confirmation. An error recorded on the result itself
/// counts as an error.
pub fn status_message(
    loading: bool,
    error: Option<&str>,
    result: Option<&UpdateResult>,
) -> Option<String> {
    if loading {
        return Some("Checking for status updates...".into());
    }

    if let Some(message) = error.or_else(|| result.and_then(|r| r.error.as_deref())) {
        return Some(format!("Update failed: {message}"));
    }

    let result = result?;

    if result.skipped {
        let reason = result.reason.as_deref().unwrap_or("no reason given");
        return Some(format!("Update skipped: {reason}"));
    }

    if result.status_changed {
        let from = result.previous_status.as_deref().unwrap_or("unknown");
        let to = result.new_status.as_deref().unwrap_or("unknown");
        return Some(format!("Status updated: {from} → {to}"));
    }

    match result.tracking_updates_count {
        0 => Some("Status confirmed - no changes".into()),
        1 => Some("1 new tracking update recorded".into()),
        n => Some(format!("{n} new tracking updates recorded")),
    }
}
