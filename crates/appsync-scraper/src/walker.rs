//! Sequential walk over listing pages.
//!
//! Pages are fetched strictly in order starting at `?page=1`; the walk ends
//! at the first page without product cards. Cards on a page are handled in
//! document order, and each one's side effects finish before the next card
//! starts.

use appsync_core::{PersistedAppliance, ProductRecord, SyncSettings};
use scraper::Html;
use tokio::sync::mpsc::UnboundedSender;

use crate::client::page_url;
use crate::error::ScraperError;
use crate::extract::product_fragments;
use crate::normalize::{normalize_fragment, FragmentIssue, FragmentOutcome};
use crate::source::ListingSource;

/// Progress notifications, delivered in order as the walk advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    PageLoaded {
        page: u32,
        url: String,
    },
    ItemProcessed {
        page: u32,
        appliance: PersistedAppliance,
    },
    ItemSkipped {
        page: u32,
        product_url: Option<String>,
        reason: String,
    },
}

/// Totals for one completed walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Pages fetched, including the final empty page.
    pub pages_visited: u32,
    pub items_processed: u32,
    /// Subset of `items_processed` that created a new catalog entry.
    pub items_inserted: u32,
    pub items_skipped: u32,
}

/// Per-record side effects run by the walker for every normalized card.
#[allow(async_fn_in_trait)]
pub trait ItemProcessor {
    /// Persists one record and returns the catalog handle for it.
    async fn process_one(&self, record: &ProductRecord) -> Result<PersistedAppliance, ScraperError>;
}

pub struct PageWalker<'a, S> {
    source: &'a S,
    settings: &'a SyncSettings,
}

impl<'a, S: ListingSource> PageWalker<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, settings: &'a SyncSettings) -> Self {
        Self { source, settings }
    }

    /// Walks every listing page, handing each record to `processor`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::PaginationLimit`] if no empty page is found within
    ///   `settings.max_pages` pages.
    /// - Fetch errors from the source (after its own retries).
    /// - [`ScraperError::Extract`] / [`ScraperError::MissingIdentifier`] for a
    ///   card the settings do not allow skipping.
    /// - Any error returned by `processor`.
    ///
    /// Records handled before the failure stay persisted.
    pub async fn run<P: ItemProcessor>(
        &self,
        processor: &P,
        events: &UnboundedSender<SyncEvent>,
    ) -> Result<SyncSummary, ScraperError> {
        let mut summary = SyncSummary::default();
        let mut page = 1u32;

        loop {
            if page > self.settings.max_pages {
                return Err(ScraperError::PaginationLimit {
                    base_url: self.settings.base_url.clone(),
                    max_pages: self.settings.max_pages,
                });
            }

            let url = page_url(&self.settings.base_url, page)?;
            let body = self.source.fetch_html(&url).await?;
            let outcomes = self.parse_page(&body);
            summary.pages_visited += 1;

            tracing::info!(page, url = %url, products = outcomes.len(), "listing page loaded");
            emit(events, SyncEvent::PageLoaded { page, url });

            if outcomes.is_empty() {
                break;
            }

            for outcome in outcomes {
                match outcome {
                    FragmentOutcome::Ok(record) => {
                        let appliance = processor.process_one(&record).await?;
                        summary.items_processed += 1;
                        if appliance.inserted {
                            summary.items_inserted += 1;
                        }
                        tracing::debug!(
                            page,
                            external_id = %appliance.external_id,
                            id = appliance.id,
                            inserted = appliance.inserted,
                            "product synced"
                        );
                        emit(events, SyncEvent::ItemProcessed { page, appliance });
                    }
                    FragmentOutcome::Skipped(issue) => {
                        summary.items_skipped += 1;
                        tracing::warn!(
                            page,
                            product_url = issue.product_url().unwrap_or("<none>"),
                            reason = %issue,
                            "skipping product card"
                        );
                        emit(
                            events,
                            SyncEvent::ItemSkipped {
                                page,
                                product_url: issue.product_url().map(str::to_owned),
                                reason: issue.to_string(),
                            },
                        );
                    }
                    FragmentOutcome::Fatal(issue) => return Err(fatal_error(page, issue)),
                }
            }

            page += 1;
        }

        Ok(summary)
    }

    /// Normalizes every card on the page. The parsed document is dropped
    /// before any per-item side effect runs.
    fn parse_page(&self, body: &str) -> Vec<FragmentOutcome> {
        let document = Html::parse_document(body);
        product_fragments(&document)
            .into_iter()
            .map(|card| normalize_fragment(card, self.settings))
            .collect()
    }
}

fn fatal_error(page: u32, issue: FragmentIssue) -> ScraperError {
    match issue {
        FragmentIssue::MissingIdentifier { product_url } => {
            ScraperError::MissingIdentifier { product_url }
        }
        FragmentIssue::Malformed { error, .. } => ScraperError::Extract {
            page,
            source: error,
        },
    }
}

fn emit(events: &UnboundedSender<SyncEvent>, event: SyncEvent) {
    if events.send(event).is_err() {
        tracing::debug!("sync event receiver dropped");
    }
}

#[cfg(test)]
#[path = "walker_test.rs"]
mod tests;
