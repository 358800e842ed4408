// ── Backend handle ──
//
// Owns the API clients for one deployment. Clients are built on first use
// and shared by every caller; `teardown` drops them so the next call
// rebuilds from the current configuration.

use serde_json::Value;
use shiptrack_api::{EventStoreClient, FunctionsClient, StatusCheckRequest, StatusCheckResponse};
use std::sync::Arc;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::shared::LazyResource;
use crate::subscription::EventStore;
use crate::updater::StatusChecker;

pub struct Backend {
    config: BackendConfig,
    functions: LazyResource<FunctionsClient>,
    events: LazyResource<EventStoreClient>,
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            functions: LazyResource::new(),
            events: LazyResource::new(),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub async fn functions(&self) -> Result<Arc<FunctionsClient>, CoreError> {
        self.functions
            .get_or_init(|| async {
                debug!(url = %self.config.functions_url, "building functions client");
                FunctionsClient::new(self.config.functions_url.clone(), &self.config.transport())
                    .map_err(CoreError::from)
            })
            .await
    }

    pub async fn event_store(&self) -> Result<Arc<EventStoreClient>, CoreError> {
        self.events
            .get_or_init(|| async {
                debug!(url = %self.config.store_url, "building event store client");
                EventStoreClient::new(self.config.store_url.clone(), &self.config.transport())
                    .map_err(CoreError::from)
            })
            .await
    }

    /// Drop both clients. Returns `true` if any had been built.
    pub fn teardown(&self) -> bool {
        let functions = self.functions.teardown().is_some();
        let events = self.events.teardown().is_some();
        functions || events
    }
}

impl StatusChecker for Backend {
    async fn smart_status_update(
        &self,
        shipment_id: &str,
        force: bool,
    ) -> Result<StatusCheckResponse, CoreError> {
        let request = StatusCheckRequest {
            shipment_id: shipment_id.to_owned(),
            force,
        };
        Ok(self.functions().await?.smart_status_update(&request).await?)
    }

    async fn force_status_refresh(&self, shipment_id: &str) -> Result<StatusCheckResponse, CoreError> {
        Ok(self.functions().await?.force_status_refresh(shipment_id).await?)
    }
}

impl EventStore for Backend {
    async fn list_events(&self, shipment_id: &str) -> Result<Vec<Value>, CoreError> {
        Ok(self.event_store().await?.list_events(shipment_id).await?)
    }

    async fn append_event(&self, shipment_id: &str, event: &Value) -> Result<bool, CoreError> {
        Ok(self.event_store().await?.append_event(shipment_id, event).await?)
    }
}
