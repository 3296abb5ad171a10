//! URL helpers for the listing client.

use reqwest::Url;

use crate::error::ScraperError;

/// Builds the URL of listing page `page` by appending `page=<n>` to the
/// base URL's query string. Existing query parameters are preserved.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base_url` is not an absolute URL.
pub fn page_url(base_url: &str, page: u32) -> Result<String, ScraperError> {
    let mut url = parse_absolute(base_url)?;
    url.query_pairs_mut()
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

/// Resolves `href` (absolute, root-relative, or relative) against `base_url`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if either URL cannot be parsed.
pub fn resolve_url(base_url: &str, href: &str) -> Result<String, ScraperError> {
    let base = parse_absolute(base_url)?;
    base.join(href.trim())
        .map(|u| u.to_string())
        .map_err(|e| ScraperError::InvalidUrl {
            url: href.to_owned(),
            reason: e.to_string(),
        })
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

fn parse_absolute(url: &str) -> Result<Url, ScraperError> {
    Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}
