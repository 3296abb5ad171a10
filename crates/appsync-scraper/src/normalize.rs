//! Assembly of extracted card fields into a [`ProductRecord`].
//!
//! Field parsing lives in [`crate::extract`]; this module stamps the run's
//! category and currency and decides what happens to cards that cannot
//! become a record.

use appsync_core::{MissingIdPolicy, ProductRecord, SyncSettings};
use scraper::ElementRef;

use crate::error::ExtractError;
use crate::extract::{
    extract_description, extract_image_url, extract_price_amount, extract_product_url,
    extract_title, parse_external_id,
};

/// Result of normalizing one product card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOutcome {
    Ok(ProductRecord),
    /// The card is ignored and the run continues.
    Skipped(FragmentIssue),
    /// The card aborts the run.
    Fatal(FragmentIssue),
}

/// Why a card could not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentIssue {
    /// The detail URL has no trailing numeric identifier.
    MissingIdentifier { product_url: String },
    /// A required element, attribute, or price could not be extracted.
    Malformed {
        product_url: Option<String>,
        error: ExtractError,
    },
}

impl FragmentIssue {
    #[must_use]
    pub fn product_url(&self) -> Option<&str> {
        match self {
            Self::MissingIdentifier { product_url } => Some(product_url),
            Self::Malformed { product_url, .. } => product_url.as_deref(),
        }
    }
}

impl std::fmt::Display for FragmentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier { .. } => f.write_str("no numeric identifier in product URL"),
            Self::Malformed { error, .. } => write!(f, "malformed card: {error}"),
        }
    }
}

/// Normalizes one product card.
///
/// Extraction failures are fatal unless `settings.skip_malformed` is set. A
/// detail URL without a trailing numeric ID is routed through
/// `settings.missing_id_policy`.
#[must_use]
pub fn normalize_fragment(card: ElementRef<'_>, settings: &SyncSettings) -> FragmentOutcome {
    let product_url = match extract_product_url(card) {
        Ok(url) => url,
        Err(error) => return malformed(None, error, settings),
    };

    let Some(external_id) = parse_external_id(&product_url) else {
        let issue = FragmentIssue::MissingIdentifier { product_url };
        return match settings.missing_id_policy {
            MissingIdPolicy::Skip => FragmentOutcome::Skipped(issue),
            MissingIdPolicy::Abort => FragmentOutcome::Fatal(issue),
        };
    };

    match build_record(card, external_id, &product_url, settings) {
        Ok(record) => FragmentOutcome::Ok(record),
        Err(error) => malformed(Some(product_url), error, settings),
    }
}

fn build_record(
    card: ElementRef<'_>,
    external_id: String,
    product_url: &str,
    settings: &SyncSettings,
) -> Result<ProductRecord, ExtractError> {
    Ok(ProductRecord {
        image_asset_key: external_id.clone(),
        external_id,
        title: extract_title(card)?,
        description: extract_description(card)?,
        product_url: product_url.to_owned(),
        image_source_url: extract_image_url(card)?,
        category: settings.category.clone(),
        price_amount: extract_price_amount(card)?,
        price_currency: settings.currency.clone(),
    })
}

fn malformed(
    product_url: Option<String>,
    error: ExtractError,
    settings: &SyncSettings,
) -> FragmentOutcome {
    let issue = FragmentIssue::Malformed { product_url, error };
    if settings.skip_malformed {
        FragmentOutcome::Skipped(issue)
    } else {
        FragmentOutcome::Fatal(issue)
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
