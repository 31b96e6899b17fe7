//! Read/write operations for the `product_aisles` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aisle_core::AisleRecord;

/// One stored annotation, as read back from the table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AisleRow {
    pub product_code: String,
    pub store: String,
    pub store_link: Option<String>,
    pub aisle: Option<String>,
    pub modified_date: DateTime<Utc>,
}

/// Upsert aisle annotations keyed by `(product_code, store)`.
///
/// Returns `(new_count, updated_count)`. Conflicting rows have their
/// `aisle`, `store_link`, and `modified_date` overwritten in place.
/// `RETURNING (xmax = 0)` distinguishes inserts from updates.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if any statement fails.
pub async fn upsert_aisle_records(
    pool: &PgPool,
    records: &[AisleRecord],
) -> Result<(u64, u64), sqlx::Error> {
    let mut new_count: u64 = 0;
    let mut updated_count: u64 = 0;

    for record in records {
        let is_new: bool = sqlx::query_scalar::<_, bool>(
            "INSERT INTO product_aisles (product_code, store, store_link, aisle, modified_date) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (product_code, store) DO UPDATE SET \
                 aisle         = EXCLUDED.aisle, \
                 store_link    = EXCLUDED.store_link, \
                 modified_date = NOW() \
             RETURNING (xmax = 0) AS is_new",
        )
        .bind(&record.product_code)
        .bind(&record.store)
        .bind(&record.store_link)
        .bind(&record.aisle)
        .fetch_one(pool)
        .await?;

        if is_new {
            new_count += 1;
        } else {
            updated_count += 1;
        }
    }

    tracing::debug!(
        new = new_count,
        updated = updated_count,
        "upserted aisle records"
    );
    Ok((new_count, updated_count))
}

/// Fetch the stored annotations for one product, newest first.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_aisles_for_product(
    pool: &PgPool,
    product_code: &str,
) -> Result<Vec<AisleRow>, sqlx::Error> {
    sqlx::query_as::<_, AisleRow>(
        "SELECT product_code, store, store_link, aisle, modified_date \
         FROM product_aisles \
         WHERE product_code = $1 \
         ORDER BY modified_date DESC, store",
    )
    .bind(product_code)
    .fetch_all(pool)
    .await
}
