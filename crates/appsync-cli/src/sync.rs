//! `appsync sync`: one full catalog sync recorded as a `sync_runs` row.

use appsync_core::{AppConfig, PersistedAppliance, ProductRecord, SyncSettings};
use appsync_scraper::{
    CatalogStore, FsBlobStore, ListingClient, ScraperError, SyncDriver, SyncEvent, SyncSummary,
};
use tokio::sync::mpsc;

use crate::fail_run_best_effort;

/// [`CatalogStore`] backed by the `appliances` table.
pub(crate) struct PgCatalog<'a> {
    pool: &'a sqlx::PgPool,
}

impl<'a> PgCatalog<'a> {
    pub(crate) fn new(pool: &'a sqlx::PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgCatalog<'_> {
    async fn upsert(&self, record: &ProductRecord) -> Result<PersistedAppliance, ScraperError> {
        appsync_db::upsert_appliance(self.pool, record)
            .await
            .map_err(|e| ScraperError::Catalog {
                external_id: record.external_id.clone(),
                source: Box::new(e),
            })
    }
}

fn build_listing_client(config: &AppConfig) -> anyhow::Result<ListingClient> {
    Ok(ListingClient::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        config.scraper_max_retries,
        config.scraper_retry_backoff_base_secs,
    )?)
}

/// Runs a sync with `settings`, tracking it in `sync_runs`.
///
/// # Errors
///
/// Returns an error if the client cannot be built, the run row cannot be
/// created or started, or the sync itself fails. A failed sync is marked
/// `failed` before the error is returned.
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    settings: SyncSettings,
) -> anyhow::Result<()> {
    let client = build_listing_client(config)?;
    let blobs = FsBlobStore::new(config.image_dir.clone());

    let run = appsync_db::create_sync_run(pool, &settings.base_url, "cli").await?;
    if let Err(e) = appsync_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }
    tracing::info!(run_id = run.id, public_id = %run.public_id, "sync run started");

    let driver = SyncDriver::new(client, blobs, PgCatalog::new(pool), settings);
    let (tx, rx) = mpsc::unbounded_channel();
    let (result, ()) = tokio::join!(driver.run(tx), report_events(rx));

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            fail_run_best_effort(pool, run.id, e.to_string()).await;
            return Err(e.into());
        }
    };

    let (pages, records) = run_counts(&summary);
    if let Err(e) = appsync_db::complete_sync_run(pool, run.id, pages, records).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    println!(
        "synced {} products ({} new, {} skipped) across {} pages",
        summary.items_processed,
        summary.items_inserted,
        summary.items_skipped,
        summary.pages_visited
    );
    Ok(())
}

/// Prints progress until the driver drops its sender.
async fn report_events(mut rx: mpsc::UnboundedReceiver<SyncEvent>) {
    while let Some(event) = rx.recv().await {
        println!("{}", describe_event(&event));
    }
}

fn describe_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::PageLoaded { page, url } => format!("page {page}: {url}"),
        SyncEvent::ItemProcessed { appliance, .. } => {
            let verb = if appliance.inserted { "added" } else { "updated" };
            format!(
                "  {verb} {} (#{}) {}",
                appliance.external_id, appliance.id, appliance.title
            )
        }
        SyncEvent::ItemSkipped {
            product_url,
            reason,
            ..
        } => format!(
            "  skipped {}: {reason}",
            product_url.as_deref().unwrap_or("<unknown>")
        ),
    }
}

fn run_counts(summary: &SyncSummary) -> (i32, i32) {
    (
        i32::try_from(summary.pages_visited).unwrap_or(i32::MAX),
        i32::try_from(summary.items_processed).unwrap_or(i32::MAX),
    )
}
