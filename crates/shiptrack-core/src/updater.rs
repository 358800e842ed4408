// ── Smart update orchestrator ──
//
// Gates refresh requests through the update policy, invokes the remote
// status check, folds carrier tracking data into the timeline store, and
// publishes the outcome on a `watch` channel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use shiptrack_api::StatusCheckResponse;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Shipment, UpdateResult, UpdateState};
use crate::normalize::{carrier_name, normalize_tracking_values, tracking_records};
use crate::policy::UpdatePolicy;
use crate::store::TimelineStore;

pub const ALREADY_IN_PROGRESS: &str = "update already in progress";

/// Remote status-check operations.
pub trait StatusChecker: Send + Sync {
    /// Let the backend decide whether to poll the carrier.
    fn smart_status_update(
        &self,
        shipment_id: &str,
        force: bool,
    ) -> impl Future<Output = Result<StatusCheckResponse, CoreError>> + Send;

    /// Poll the carrier unconditionally.
    fn force_status_refresh(
        &self,
        shipment_id: &str,
    ) -> impl Future<Output = Result<StatusCheckResponse, CoreError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Smart,
    Force,
}

struct UpdaterInner<B> {
    backend: B,
    store: TimelineStore,
    policy: UpdatePolicy,
    state: watch::Sender<UpdateState>,
    /// One lock per shipment id with a call in flight.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    active: AtomicUsize,
    cancel: CancellationToken,
}

/// Bookkeeping for one remote call: raises `loading` on creation, lowers
/// it and releases the shipment lock on drop.
struct InFlight<'a, B> {
    inner: &'a UpdaterInner<B>,
    shipment_id: &'a str,
    lock: Option<OwnedMutexGuard<()>>,
}

impl<'a, B> InFlight<'a, B> {
    fn begin(inner: &'a UpdaterInner<B>, shipment_id: &'a str, lock: OwnedMutexGuard<()>) -> Self {
        inner.active.fetch_add(1, Ordering::SeqCst);
        if !inner.cancel.is_cancelled() {
            inner.state.send_modify(|s| {
                s.loading = true;
                s.error = None;
            });
        }
        Self {
            inner,
            shipment_id,
            lock: Some(lock),
        }
    }
}

impl<B> Drop for InFlight<'_, B> {
    fn drop(&mut self) {
        let remaining = self.inner.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        if !self.inner.cancel.is_cancelled() {
            self.inner.state.send_modify(|s| s.loading = remaining > 0);
        }
        drop(self.lock.take());
        self.inner
            .in_flight
            .remove_if(self.shipment_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Policy-gated refresh driver.
///
/// Cheaply cloneable; clones share state, locks and the timeline store.
/// At most one remote call per shipment runs at a time: an overlapping
/// non-forced call is skipped, an overlapping forced call waits its turn.
pub struct SmartUpdater<B> {
    inner: Arc<UpdaterInner<B>>,
}

impl<B> Clone for SmartUpdater<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: StatusChecker> SmartUpdater<B> {
    pub fn new(backend: B, store: TimelineStore, policy: UpdatePolicy) -> Self {
        let (state, _) = watch::channel(UpdateState::default());
        Self {
            inner: Arc::new(UpdaterInner {
                backend,
                store,
                policy,
                state,
                in_flight: DashMap::new(),
                active: AtomicUsize::new(0),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn store(&self) -> &TimelineStore {
        &self.inner.store
    }

    pub fn policy(&self) -> &UpdatePolicy {
        &self.inner.policy
    }

    // ── Observable state ─────────────────────────────────────────────

    pub fn state(&self) -> UpdateState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<UpdateState> {
        self.inner.state.subscribe()
    }

    pub fn status_message(&self) -> Option<String> {
        self.inner.state.borrow().status_message()
    }

    /// Stop applying results. Calls already in flight still return their
    /// result to the caller.
    pub fn close(&self) {
        self.inner.cancel.cancel();
        self.inner.state.send_modify(|s| s.loading = false);
        debug!("smart updater closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Refresh a shipment if the policy allows (or `force` is set).
    ///
    /// Returns `None` only when the shipment has no id. Gated shipments get
    /// a skipped result without any remote call; remote failures come back
    /// as `success: false` results and are never propagated.
    pub async fn perform_smart_update(
        &self,
        shipment: &Shipment,
        force: bool,
    ) -> Option<UpdateResult> {
        if shipment.id.is_empty() {
            warn!("smart update requested for a shipment without id");
            return None;
        }

        if !force {
            let decision = self.inner.policy.evaluate(shipment, Utc::now());
            if !decision.is_eligible() {
                let result = UpdateResult::skipped(decision.reason(), false, Utc::now());
                debug!(shipment = %shipment.id, reason = ?result.reason, "update gated by policy");
                self.apply(&result);
                return Some(result);
            }
        }

        self.run(shipment, force, Endpoint::Smart).await
    }

    /// Poll the carrier for a shipment regardless of policy.
    pub async fn force_refresh(&self, shipment: &Shipment) -> Option<UpdateResult> {
        if shipment.id.is_empty() {
            warn!("forced refresh requested for a shipment without id");
            return None;
        }
        self.run(shipment, true, Endpoint::Force).await
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn run(&self, shipment: &Shipment, force: bool, endpoint: Endpoint) -> Option<UpdateResult> {
        let Some(lock) = self.acquire(&shipment.id, force).await else {
            debug!(shipment = %shipment.id, "overlapping update skipped");
            return Some(UpdateResult::skipped(ALREADY_IN_PROGRESS, force, Utc::now()));
        };

        // Dropped on completion or when the caller abandons this future.
        let call = InFlight::begin(&self.inner, &shipment.id, lock);
        let outcome = match endpoint {
            Endpoint::Smart => self.inner.backend.smart_status_update(&shipment.id, force).await,
            Endpoint::Force => self.inner.backend.force_status_refresh(&shipment.id).await,
        };
        let result = self.settle(shipment, force, outcome);
        self.record(&result);
        drop(call);

        Some(result)
    }

    /// Per-shipment lock: waits when forced, gives up when already held.
    async fn acquire(&self, shipment_id: &str, wait: bool) -> Option<OwnedMutexGuard<()>> {
        let lock = Arc::clone(
            self.inner
                .in_flight
                .entry(shipment_id.to_owned())
                .or_default()
                .value(),
        );
        if wait {
            Some(lock.lock_owned().await)
        } else {
            lock.try_lock_owned().ok()
        }
    }

    fn settle(
        &self,
        shipment: &Shipment,
        force: bool,
        outcome: Result<StatusCheckResponse, CoreError>,
    ) -> UpdateResult {
        let now = Utc::now();
        match outcome {
            Ok(resp) => {
                let mut result = UpdateResult::from_response(&resp, force, now);
                if !result.success && result.error.is_none() {
                    result.error = Some(
                        result
                            .reason
                            .clone()
                            .unwrap_or_else(|| "status check was not successful".into()),
                    );
                }
                if !self.is_closed() {
                    self.publish_tracking(shipment, &resp, now);
                }
                if result.status_changed {
                    info!(
                        shipment = %shipment.id,
                        from = ?result.previous_status,
                        to = ?result.new_status,
                        "shipment status changed"
                    );
                }
                result
            }
            Err(e) => {
                warn!(shipment = %shipment.id, error = %e, "status check failed");
                UpdateResult::failed(e.to_string(), force, now)
            }
        }
    }

    fn publish_tracking(
        &self,
        shipment: &Shipment,
        resp: &StatusCheckResponse,
        now: chrono::DateTime<Utc>,
    ) {
        let Some(data) = resp.carrier_data.as_ref() else {
            return;
        };
        let records = tracking_records(data);
        if records.is_empty() {
            return;
        }
        let events = normalize_tracking_values(records, carrier_name(data), now);
        debug!(shipment = %shipment.id, count = events.len(), "publishing tracking events");
        self.inner.store.track(shipment);
        self.inner.store.apply_tracking(&shipment.id, events);
    }

    fn record(&self, result: &UpdateResult) {
        if self.is_closed() {
            debug!("result arrived after close, not applied");
            return;
        }
        self.inner.state.send_modify(|s| {
            s.error.clone_from(&result.error);
            s.last_result = Some(result.clone());
        });
    }

    /// Record a locally built result (no remote call involved).
    fn apply(&self, result: &UpdateResult) {
        if self.is_closed() {
            return;
        }
        self.inner.state.send_modify(|s| {
            s.error = None;
            s.last_result = Some(result.clone());
        });
    }
}
