// ── Batch updater ──
//
// Refreshes many shipments with bounded concurrency: fixed-size chunks
// run concurrently, with a cooldown between chunks to stay under the
// backend's rate limits.

use std::time::Duration;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{Shipment, UpdateResult};
use crate::updater::{SmartUpdater, StatusChecker};

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub chunk_size: usize,
    #[serde(with = "crate::policy::duration_str")]
    pub cooldown: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            cooldown: Duration::from_secs(1),
        }
    }
}

/// Outcome for one shipment in a batch. `result` is `None` when the
/// shipment had no id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub shipment_id: String,
    pub result: Option<UpdateResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

impl BatchSummary {
    fn record(&mut self, item: BatchItem) {
        self.processed += 1;
        match &item.result {
            Some(r) if !r.success => self.failed += 1,
            Some(r) if r.skipped => self.skipped += 1,
            Some(r) if r.updated || r.status_changed => self.updated += 1,
            Some(_) => {}
            None => self.failed += 1,
        }
        self.results.push(item);
    }
}

/// Run the smart update over `shipments` in chunks.
///
/// `on_progress` is called after each chunk with the number of shipments
/// done so far. Results keep input order.
pub async fn run_batch<B, F>(
    updater: &SmartUpdater<B>,
    shipments: &[Shipment],
    force: bool,
    config: &BatchConfig,
    mut on_progress: F,
) -> BatchSummary
where
    B: StatusChecker,
    F: FnMut(usize),
{
    let chunk_size = config.chunk_size.max(1);
    let chunk_count = shipments.len().div_ceil(chunk_size);
    let mut summary = BatchSummary::default();

    for (index, chunk) in shipments.chunks(chunk_size).enumerate() {
        debug!(chunk = index + 1, of = chunk_count, size = chunk.len(), "batch chunk");

        let results = join_all(
            chunk
                .iter()
                .map(|shipment| updater.perform_smart_update(shipment, force)),
        )
        .await;

        for (shipment, result) in chunk.iter().zip(results) {
            summary.record(BatchItem {
                shipment_id: shipment.id.clone(),
                result,
            });
        }
        on_progress(summary.processed);

        if index + 1 < chunk_count && !config.cooldown.is_zero() {
            tokio::time::sleep(config.cooldown).await;
        }
    }

    info!(
        processed = summary.processed,
        updated = summary.updated,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch complete"
    );
    summary
}
