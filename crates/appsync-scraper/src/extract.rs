//! Field extractors for listing-page product cards.
//!
//! Each extractor reads exactly one fixed selector path from a card; there
//! are no fallback selectors. A missing element or attribute is an
//! [`ExtractError`].
//!
//! Card layout:
//! ```text
//! div.search-results-product
//! ├── div.product-image > img.img-responsive[src]
//! ├── h4 > a[href]                       (title markup + detail link)
//! ├── ul.result-list-item-desc-list > li (feature bullets, may be empty)
//! └── h3                                 (price, e.g. "€1,234.50")
//! ```

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;

const CARD: &str = "div.search-results-product";
const TITLE_LINK: &str = "h4 a";
const DESCRIPTION_LIST: &str = "ul.result-list-item-desc-list";
const IMAGE: &str = "div.product-image img.img-responsive";
const PRICE: &str = "h3";

static CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(CARD).expect("valid card selector"));
static TITLE_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(TITLE_LINK).expect("valid title selector"));
static DESCRIPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(DESCRIPTION_LIST).expect("valid description selector"));
static IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(IMAGE).expect("valid image selector"));
static PRICE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PRICE).expect("valid price selector"));

static TRAILING_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)$").expect("valid id regex"));

/// Returns every product card on a listing page, in document order.
#[must_use]
pub fn product_fragments(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&CARD_SEL).collect()
}

fn first<'a>(
    card: ElementRef<'a>,
    selector: &Selector,
    name: &'static str,
) -> Result<ElementRef<'a>, ExtractError> {
    card.select(selector)
        .next()
        .ok_or(ExtractError::MissingElement { selector: name })
}

fn attr<'a>(
    element: ElementRef<'a>,
    name: &'static str,
    attribute: &'static str,
) -> Result<&'a str, ExtractError> {
    element
        .value()
        .attr(attribute)
        .ok_or(ExtractError::MissingAttribute {
            selector: name,
            attribute,
        })
}

/// Title anchor inner HTML; nested markup is kept as-is.
///
/// # Errors
///
/// Returns [`ExtractError::MissingElement`] if the card has no `h4 a`.
pub fn extract_title(card: ElementRef<'_>) -> Result<String, ExtractError> {
    Ok(first(card, &TITLE_LINK_SEL, TITLE_LINK)?.inner_html())
}

/// Detail page link of the title anchor.
///
/// # Errors
///
/// Returns an [`ExtractError`] if the anchor or its `href` is missing.
pub fn extract_product_url(card: ElementRef<'_>) -> Result<String, ExtractError> {
    let link = first(card, &TITLE_LINK_SEL, TITLE_LINK)?;
    Ok(attr(link, TITLE_LINK, "href")?.to_owned())
}

/// Vendor product ID taken from the detail link.
///
/// `Ok(None)` means the link exists but carries no trailing digits.
///
/// # Errors
///
/// Returns an [`ExtractError`] if the anchor or its `href` is missing.
pub fn extract_external_id(card: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    extract_product_url(card).map(|url| parse_external_id(&url))
}

/// Matches the run of digits that ends the URL path, e.g.
/// `".../product/9981"` → `Some("9981")`.
#[must_use]
pub fn parse_external_id(product_url: &str) -> Option<String> {
    TRAILING_ID_RE
        .captures(product_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Feature list markup wrapped in a single `<ul>` shell, or `""`.
///
/// # Errors
///
/// Returns [`ExtractError::MissingElement`] if the card has no feature list.
pub fn extract_description(card: ElementRef<'_>) -> Result<String, ExtractError> {
    let list = first(card, &DESCRIPTION_SEL, DESCRIPTION_LIST)?;
    Ok(wrap_description(&list.inner_html()))
}

/// Wraps list-item markup in `<ul>…</ul>`. Only an empty string stays `""`;
/// whitespace is markup like any other and gets wrapped.
#[must_use]
pub fn wrap_description(raw: &str) -> String {
    if raw.is_empty() {
        String::new()
    } else {
        format!("<ul>{raw}</ul>")
    }
}

/// Product image `src`.
///
/// # Errors
///
/// Returns an [`ExtractError`] if the image or its `src` is missing.
pub fn extract_image_url(card: ElementRef<'_>) -> Result<String, ExtractError> {
    let image = first(card, &IMAGE_SEL, IMAGE)?;
    Ok(attr(image, IMAGE, "src")?.trim().to_owned())
}

/// Price in minor units.
///
/// # Errors
///
/// Returns [`ExtractError::MissingElement`] if there is no price heading, or
/// [`ExtractError::InvalidPrice`] if its text is not a non-negative amount.
pub fn extract_price_amount(card: ElementRef<'_>) -> Result<i64, ExtractError> {
    let heading = first(card, &PRICE_SEL, PRICE)?;
    parse_price_amount(&heading.text().collect::<String>())
}

/// Converts a display price such as `"€1,234.50"` into cents (`123450`).
///
/// Strips the euro glyph (literal or `&euro;` entity), thousands separators
/// and whitespace, then rounds `amount * 100` half away from zero.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidPrice`] if the remainder is not a decimal
/// number, is negative, or does not fit in `i64` cents.
pub fn parse_price_amount(raw: &str) -> Result<i64, ExtractError> {
    let invalid = |reason: &str| ExtractError::InvalidPrice {
        raw: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let cleaned: String = raw
        .replace("&euro;", "")
        .chars()
        .filter(|c| *c != '€' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(invalid("no digits"));
    }

    let amount = Decimal::from_str(&cleaned).map_err(|e| invalid(&e.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid("negative amount"));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| invalid("amount out of range"))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
