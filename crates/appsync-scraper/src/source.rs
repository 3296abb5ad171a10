//! The network seam between the sync pipeline and the remote site.

use crate::error::ScraperError;

/// Fetches raw listing markup and image bytes.
///
/// [`crate::ListingClient`] is the HTTP implementation; tests substitute
/// in-memory sources. Every call completes (or fails) before the pipeline
/// takes its next step.
#[allow(async_fn_in_trait)]
pub trait ListingSource {
    /// Fetches the HTML body at `url`.
    async fn fetch_html(&self, url: &str) -> Result<String, ScraperError>;

    /// Fetches the raw bytes at `url`.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError>;
}
