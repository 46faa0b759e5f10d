//! Product stock service for listing and clearing inventory lots

use sqlx::PgPool;

use shared::models::Product;

use crate::error::AppResult;
use crate::services::catalog::ProductRow;

/// Product service for stock queries and maintenance
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List every stock lot, grouped by code with oldest expiry first
    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, code, name, unit, quantity_available, expires_at, lot_code,
                   created_at, updated_at
            FROM products
            ORDER BY code ASC, expires_at ASC NULLS LAST, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Delete every product row and report how many were removed
    ///
    /// Recipe components keep their product references; the feasibility
    /// engine treats the dangling rows as zero requirement until the next
    /// inventory import re-anchors them.
    pub async fn clear_stock(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM products").execute(&self.db).await?;

        Ok(result.rows_affected())
    }
}
