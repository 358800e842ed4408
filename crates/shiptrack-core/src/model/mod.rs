// ── Domain model ──
//
// Canonical types shared by every component: normalized timeline events,
// the caller-supplied shipment record, and update results.

pub mod display;
pub mod event;
pub mod shipment;
pub mod update;

pub use display::DisplayStyle;
pub use event::{EventOrigin, EventType, Location, StatusChange, TimelineEvent, UserData};
pub use shipment::{Shipment, ShipmentStatus, StatusTier};
pub use update::{UpdateResult, UpdateState};
