//! Batch smart update with a progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use shiptrack_core::{
    Backend, BackendConfig, BatchItem, BatchSummary, SmartUpdater, TimelineStore, run_batch,
    status_message,
};

use crate::cli::{BatchArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Shipment")]
    shipment: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Tracking")]
    tracking: String,
}

fn outcome(item: &BatchItem) -> String {
    match item.result {
        Some(ref r) => status_message(false, None, Some(r)).unwrap_or_default(),
        None => "Update failed: shipment has no id".into(),
    }
}

impl From<&BatchItem> for BatchRow {
    fn from(item: &BatchItem) -> Self {
        Self {
            shipment: item.shipment_id.clone(),
            outcome: outcome(item),
            tracking: item
                .result
                .as_ref()
                .map(|r| r.tracking_updates_count.to_string())
                .unwrap_or_default(),
        }
    }
}

fn progress_bar(total: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "{} processed: {} updated, {} skipped, {} failed",
        summary.processed, summary.updated, summary.skipped, summary.failed
    )
}

pub async fn handle(
    config: BackendConfig,
    args: &BatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let shipments = util::read_shipments(&args.file)?;

    let mut batch = config.batch;
    if let Some(size) = args.chunk_size {
        if size == 0 {
            return Err(CliError::Validation {
                field: "chunk-size".into(),
                reason: "must be at least 1".into(),
            });
        }
        batch.chunk_size = size;
    }
    if let Some(ref raw) = args.cooldown {
        batch.cooldown = config::parse_duration_flag("cooldown", raw)?;
    }

    let policy = config.policy;
    let updater = SmartUpdater::new(Backend::new(config), TimelineStore::new(), policy);

    let bar = progress_bar(shipments.len(), global.quiet);
    let summary = run_batch(&updater, &shipments, args.force, &batch, |done| {
        bar.set_position(u64::try_from(done).unwrap_or(u64::MAX));
    })
    .await;
    bar.finish_and_clear();

    let out = output::render_list(
        global.output,
        &summary.results,
        |item| BatchRow::from(item),
        |item| format!("{}\t{}", item.shipment_id, outcome(item)),
    )?;
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!("{}", summary_line(&summary));
    }

    if summary.failed > 0 {
        return Err(CliError::UpdateFailed {
            message: format!("{} of {} shipments failed to update", summary.failed, summary.processed),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shiptrack_core::UpdateResult;

    #[test]
    fn rows_describe_each_outcome() {
        let ok = BatchItem {
            shipment_id: "S1".into(),
            result: Some(UpdateResult::skipped("shipment is delivered", false, Utc::now())),
        };
        let row = BatchRow::from(&ok);
        assert_eq!(row.outcome, "Update skipped: shipment is delivered");
        assert_eq!(row.tracking, "0");

        let missing = BatchItem {
            shipment_id: String::new(),
            result: None,
        };
        assert_eq!(BatchRow::from(&missing).tracking, "");
    }

    #[test]
    fn summary_line_counts() {
        let summary = BatchSummary {
            processed: 4,
            updated: 1,
            skipped: 2,
            failed: 1,
            results: Vec::new(),
        };
        assert_eq!(summary_line(&summary), "4 processed: 1 updated, 2 skipped, 1 failed");
    }
}
