use serde::{Deserialize, Serialize};

/// A product card scraped from a listing page, normalized for storage.
///
/// Built fresh from one markup fragment on every page visit; it has no
/// identity of its own until the catalog upsert returns a
/// [`PersistedAppliance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Vendor product ID parsed from the detail URL. Natural upsert key.
    pub external_id: String,
    /// Inner HTML of the card's title anchor; inline markup is preserved.
    pub title: String,
    /// Feature list wrapped in `<ul>…</ul>`, or `""` when the card has none.
    pub description: String,
    /// Detail page link exactly as it appears in the markup.
    pub product_url: String,
    /// Blob key the product image is stored under. Always equal to
    /// `external_id`.
    pub image_asset_key: String,
    /// Image `src` exactly as it appears in the markup.
    pub image_source_url: String,
    pub category: String,
    /// Price in minor currency units (cents).
    pub price_amount: i64,
    /// ISO 4217 currency code, e.g. `"EUR"`.
    pub price_currency: String,
}

/// Handle for a catalog entry returned by an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAppliance {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    /// `true` when the upsert created the row, `false` when it overwrote one.
    pub inserted: bool,
}
