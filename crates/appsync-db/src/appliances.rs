//! Database operations for the `appliances` catalog table.

use appsync_core::{PersistedAppliance, ProductRecord};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `appliances` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApplianceRow {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub product_url: String,
    /// Blob key of the stored product image (equal to `external_id`).
    pub image: String,
    pub image_url: String,
    pub category: String,
    /// Minor currency units.
    pub price_amount: i64,
    pub price_currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UpsertedRow {
    id: i64,
    external_id: String,
    title: String,
    inserted: bool,
}

/// Inserts or fully overwrites the catalog entry keyed by `external_id`.
///
/// Every column is replaced with the record's value; nothing from the
/// previous row is merged. `inserted` on the returned handle is derived from
/// `xmax = 0`, which only holds for rows created by this statement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_appliance(
    pool: &PgPool,
    record: &ProductRecord,
) -> Result<PersistedAppliance, DbError> {
    let row = sqlx::query_as::<_, UpsertedRow>(
        "INSERT INTO appliances \
             (external_id, title, description, product_url, image, image_url, \
              category, price_amount, price_currency) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (external_id) DO UPDATE SET \
             title          = EXCLUDED.title, \
             description    = EXCLUDED.description, \
             product_url    = EXCLUDED.product_url, \
             image          = EXCLUDED.image, \
             image_url      = EXCLUDED.image_url, \
             category       = EXCLUDED.category, \
             price_amount   = EXCLUDED.price_amount, \
             price_currency = EXCLUDED.price_currency, \
             updated_at     = NOW() \
         RETURNING id, external_id, title, (xmax = 0) AS inserted",
    )
    .bind(&record.external_id)
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.product_url)
    .bind(&record.image_asset_key)
    .bind(&record.image_source_url)
    .bind(&record.category)
    .bind(record.price_amount)
    .bind(&record.price_currency)
    .fetch_one(pool)
    .await?;

    Ok(PersistedAppliance {
        id: row.id,
        external_id: row.external_id,
        title: row.title,
        inserted: row.inserted,
    })
}

/// Fetches the catalog entry for a vendor product ID, if present.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_appliance_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<ApplianceRow>, DbError> {
    let row = sqlx::query_as::<_, ApplianceRow>(
        "SELECT id, external_id, title, description, product_url, image, image_url, \
                category, price_amount, price_currency, created_at, updated_at \
         FROM appliances \
         WHERE external_id = $1",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the most recently updated `limit` entries, optionally restricted
/// to one category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_appliances(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<ApplianceRow>, DbError> {
    let rows = sqlx::query_as::<_, ApplianceRow>(
        "SELECT id, external_id, title, description, product_url, image, image_url, \
                category, price_amount, price_currency, created_at, updated_at \
         FROM appliances \
         WHERE ($1::TEXT IS NULL OR category = $1) \
         ORDER BY updated_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(category)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts catalog entries.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_appliances(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appliances")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
