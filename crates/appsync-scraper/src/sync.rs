//! Per-product side effects and the top-level sync entry point.

use appsync_core::{PersistedAppliance, ProductRecord, SyncSettings};
use tokio::sync::mpsc::UnboundedSender;

use crate::client::resolve_url;
use crate::error::ScraperError;
use crate::source::ListingSource;
use crate::walker::{ItemProcessor, PageWalker, SyncEvent, SyncSummary};

/// Read access granted to a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Content store for product images.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    /// Stores `bytes` under `key`, replacing any existing blob.
    async fn put(&self, key: &str, bytes: &[u8], visibility: Visibility)
        -> Result<(), ScraperError>;
}

/// Catalog record store keyed by `external_id`.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    /// Inserts the record, or overwrites every field of the entry with the
    /// same `external_id`. Repeating an identical call must not create a
    /// second entry.
    async fn upsert(&self, record: &ProductRecord) -> Result<PersistedAppliance, ScraperError>;
}

/// Drives a full catalog sync: walks the listing and, for every product,
/// stores its image and upserts its catalog entry.
pub struct SyncDriver<S, B, C> {
    source: S,
    blobs: B,
    catalog: C,
    settings: SyncSettings,
}

impl<S, B, C> SyncDriver<S, B, C>
where
    S: ListingSource,
    B: BlobStore,
    C: CatalogStore,
{
    #[must_use]
    pub fn new(source: S, blobs: B, catalog: C, settings: SyncSettings) -> Self {
        Self {
            source,
            blobs,
            catalog,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    #[must_use]
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Runs one full sync from page 1. Progress is published on `events`;
    /// the sender is dropped when the run ends, closing the channel.
    ///
    /// # Errors
    ///
    /// Returns the first error hit by the walk or by a product's side
    /// effects. Products already handled stay persisted.
    pub async fn run(&self, events: UnboundedSender<SyncEvent>) -> Result<SyncSummary, ScraperError> {
        tracing::info!(
            base_url = %self.settings.base_url,
            category = %self.settings.category,
            currency = %self.settings.currency,
            "starting catalog sync"
        );
        let summary = PageWalker::new(&self.source, &self.settings)
            .run(self, &events)
            .await?;
        tracing::info!(
            pages = summary.pages_visited,
            processed = summary.items_processed,
            inserted = summary.items_inserted,
            skipped = summary.items_skipped,
            "catalog sync finished"
        );
        Ok(summary)
    }
}

impl<S, B, C> ItemProcessor for SyncDriver<S, B, C>
where
    S: ListingSource,
    B: BlobStore,
    C: CatalogStore,
{
    /// Fetches the product image, stores it under `image_asset_key`, then
    /// upserts the catalog entry. A failed upsert does not remove the
    /// stored image.
    async fn process_one(&self, record: &ProductRecord) -> Result<PersistedAppliance, ScraperError> {
        let image_url = resolve_url(&self.settings.base_url, &record.image_source_url)?;
        let bytes = self.source.fetch_bytes(&image_url).await?;
        self.blobs
            .put(&record.image_asset_key, &bytes, Visibility::Public)
            .await?;
        tracing::debug!(
            external_id = %record.external_id,
            image_url = %image_url,
            bytes = bytes.len(),
            "product image stored"
        );

        self.catalog.upsert(record).await
    }
}
