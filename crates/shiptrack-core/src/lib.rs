//! Shipment timeline reconciliation between `shiptrack-api` and its consumers.
//!
//! This crate owns the domain model and the decision logic:
//!
//! - **Normalization** ([`normalize`]) turns carrier tracking payloads and
//!   stored lifecycle documents into canonical [`TimelineEvent`]s. Parsing is
//!   total: bad fields get defaults and never abort a list.
//!
//! - **[`merge_timeline`]** combines both sources newest-first and adds a
//!   synthetic `created` entry when the history has none.
//!
//! - **[`UpdatePolicy`]** gates automatic carrier polls and recommends a
//!   polling cadence per status tier.
//!
//! - **[`SmartUpdater`]** drives a refresh end to end: policy gate, remote
//!   status check, tracking publication into the [`TimelineStore`], and an
//!   observable [`UpdateState`] whose [`status_message`] summarizes the
//!   last attempt.
//!
//! - **[`EventFeed`]** loads, appends, and live-subscribes to the
//!   per-shipment event list; subscribers read a [`TimelineStream`].
//!
//! - **[`run_batch`]** refreshes many shipments in rate-limited chunks.
//!
//! - **[`Backend`]** is the production [`StatusChecker`] + [`EventStore`],
//!   building its HTTP clients once through a [`LazyResource`].

pub mod backend;
pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod rates;
pub mod report;
pub mod shared;
pub mod store;
pub mod stream;
pub mod subscription;
pub mod timeline;
pub mod updater;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use batch::{BatchConfig, BatchItem, BatchSummary, run_batch};
pub use config::{BackendConfig, TlsVerification};
pub use error::CoreError;
pub use policy::{PolicyDecision, UpdatePolicy, recommended_check_interval, should_auto_update};
pub use rates::{RateFields, RateOrigin, ResolvedRate, resolve_rate};
pub use report::status_message;
pub use shared::LazyResource;
pub use store::TimelineStore;
pub use stream::{TimelineStream, TimelineWatchStream};
pub use subscription::{EventFeed, EventStore, Subscription};
pub use timeline::{merge_timeline, synthetic_created_event};
pub use updater::{SmartUpdater, StatusChecker};

pub use model::{
    DisplayStyle, EventOrigin, EventType, Location, Shipment, ShipmentStatus, StatusChange,
    StatusTier, TimelineEvent, UpdateResult, UpdateState, UserData,
};
