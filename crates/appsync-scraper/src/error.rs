use thiserror::Error;

/// Failure to pull one field out of a product card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("expected element \"{selector}\" is missing")]
    MissingElement { selector: &'static str },

    #[error("element \"{selector}\" has no \"{attribute}\" attribute")]
    MissingAttribute {
        selector: &'static str,
        attribute: &'static str,
    },

    #[error("price \"{raw}\" is not a valid amount: {reason}")]
    InvalidPrice { raw: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("malformed product card on page {page}: {source}")]
    Extract {
        page: u32,
        #[source]
        source: ExtractError,
    },

    #[error("product {product_url} has no numeric identifier in its URL")]
    MissingIdentifier { product_url: String },

    #[error("pagination limit reached for {base_url}: exceeded {max_pages} pages")]
    PaginationLimit { base_url: String, max_pages: u32 },

    #[error("invalid blob key \"{key}\"")]
    InvalidBlobKey { key: String },

    #[error("failed to store blob \"{key}\": {source}")]
    BlobStore {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog upsert failed for product {external_id}: {source}")]
    Catalog {
        external_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
