//! Input-row reader: product codes and their raw store-links cells.

use sqlx::PgPool;

use aisle_core::{parse_store_links, ProductRow};

/// One raw row from the `products` table. The store-links cell is kept
/// as text; parsing it is the tolerant parser's job.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InputRow {
    pub product_code: String,
    pub store_links: Option<String>,
}

impl InputRow {
    /// Parse the raw cell into a [`ProductRow`]. `None` when the cell is
    /// absent or unparseable.
    #[must_use]
    pub fn to_product_row(&self) -> Option<ProductRow> {
        let raw = self.store_links.as_deref()?;
        let store_links = parse_store_links(raw)?;
        if store_links.is_empty() {
            return None;
        }
        Some(ProductRow {
            product_code: self.product_code.clone(),
            store_links,
        })
    }
}

/// Fetch up to `limit` product rows that have a store-links cell.
/// `None` fetches everything.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_product_rows(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<InputRow>, sqlx::Error> {
    let rows = match limit {
        Some(limit) => {
            sqlx::query_as::<_, InputRow>(
                "SELECT product_code, store_links FROM products \
                 WHERE store_links IS NOT NULL \
                 ORDER BY product_code \
                 LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, InputRow>(
                "SELECT product_code, store_links FROM products \
                 WHERE store_links IS NOT NULL \
                 ORDER BY product_code",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_row_parses_to_product_row() {
        let row = InputRow {
            product_code: "P1".to_string(),
            store_links: Some(
                r#"{"tesco": "https://www.tesco.com/groceries/en-GB/products/1"}"#.to_string(),
            ),
        };
        let product = row.to_product_row().expect("parseable");
        assert_eq!(product.product_code, "P1");
        assert_eq!(product.store_links.len(), 1);
    }

    #[test]
    fn missing_or_garbage_cell_yields_none() {
        let absent = InputRow {
            product_code: "P2".to_string(),
            store_links: None,
        };
        assert!(absent.to_product_row().is_none());

        let garbage = InputRow {
            product_code: "P3".to_string(),
            store_links: Some("not a mapping".to_string()),
        };
        assert!(garbage.to_product_row().is_none());
    }

    #[test]
    fn empty_mapping_yields_none() {
        let row = InputRow {
            product_code: "P4".to_string(),
            store_links: Some(r#"{"note": "discontinued"}"#.to_string()),
        };
        assert!(row.to_product_row().is_none());
    }
}
