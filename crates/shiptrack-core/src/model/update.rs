// ── Update results ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shiptrack_api::StatusCheckResponse;

use crate::report;

/// Outcome of one refresh attempt. Produced per attempt, never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub success: bool,
    pub updated: bool,
    pub skipped: bool,
    pub status_changed: bool,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub tracking_updates_count: u32,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub forced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResult {
    /// Lift a remote answer into a result.
    pub fn from_response(resp: &StatusCheckResponse, forced: bool, now: DateTime<Utc>) -> Self {
        Self {
            success: resp.success,
            updated: resp.updated,
            skipped: resp.skipped,
            status_changed: resp.status_changed,
            previous_status: resp.previous_status.clone(),
            new_status: resp.new_status.clone(),
            tracking_updates_count: resp.tracking_updates_count,
            reason: resp.reason.clone(),
            timestamp: now,
            forced,
            error: None,
        }
    }

    /// A refresh that was gated before any remote call.
    pub fn skipped(reason: impl Into<String>, forced: bool, now: DateTime<Utc>) -> Self {
        Self {
            success: true,
            updated: false,
            skipped: true,
            status_changed: false,
            previous_status: None,
            new_status: None,
            tracking_updates_count: 0,
            reason: Some(reason.into()),
            timestamp: now,
            forced,
            error: None,
        }
    }

    /// A remote call that failed.
    pub fn failed(message: impl Into<String>, forced: bool, now: DateTime<Utc>) -> Self {
        Self {
            success: false,
            updated: false,
            skipped: false,
            status_changed: false,
            previous_status: None,
            new_status: None,
            tracking_updates_count: 0,
            reason: None,
            timestamp: now,
            forced,
            error: Some(message.into()),
        }
    }
}

/// Observable state of an updater: in-flight flag, last error, last result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateState {
    pub loading: bool,
    pub error: Option<String>,
    pub last_result: Option<UpdateResult>,
}

impl UpdateState {
    /// Human-readable status line for the current state.
    pub fn status_message(&self) -> Option<String> {
        report::status_message(self.loading, self.error.as_deref(), self.last_result.as_ref())
    }
}
