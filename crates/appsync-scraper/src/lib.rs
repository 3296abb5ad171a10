pub mod blob;
pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
mod rate_limit;
pub mod source;
pub mod sync;
pub mod walker;

pub use blob::FsBlobStore;
pub use client::ListingClient;
pub use error::{ExtractError, ScraperError};
pub use normalize::{normalize_fragment, FragmentIssue, FragmentOutcome};
pub use source::ListingSource;
pub use sync::{BlobStore, CatalogStore, SyncDriver, Visibility};
pub use walker::{ItemProcessor, PageWalker, SyncEvent, SyncSummary};
