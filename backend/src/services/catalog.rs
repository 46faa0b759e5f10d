//! Read-only catalog access for the feasibility engine

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Product, Recipe, RecipeComponent, RecipeWithComponents, Unit};

use crate::error::{AppError, AppResult};

/// Read interface over products and recipes
///
/// The feasibility engine sees storage only through this trait. The HTTP
/// layer injects the Postgres-backed [`PgCatalog`]; tests inject an in-memory
/// implementation.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Fetch a recipe with its components, or `None` for an unknown id
    async fn recipe_by_id(&self, id: Uuid) -> AppResult<Option<RecipeWithComponents>>;

    /// Fetch a single product row, or `None` when it no longer exists
    async fn product_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Fetch every stock lot sharing a product code, ordered by expiry
    /// ascending with undated lots sorted last
    async fn products_by_code(&self, code: &str) -> AppResult<Vec<Product>>;
}

/// Postgres-backed catalog
#[derive(Clone)]
pub struct PgCatalog {
    db: PgPool,
}

/// Row for product queries
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub quantity_available: Decimal,
    pub expires_at: Option<NaiveDate>,
    pub lot_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub(crate) fn into_product(self) -> AppResult<Product> {
        let unit = Unit::from_str(&self.unit).ok_or_else(|| {
            AppError::Internal(format!("unrecognized stored unit '{}'", self.unit))
        })?;

        Ok(Product {
            id: self.id,
            code: self.code,
            name: self.name,
            unit,
            quantity_available: self.quantity_available,
            expires_at: self.expires_at,
            lot_code: self.lot_code,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for recipe component queries
#[derive(Debug, FromRow)]
struct ComponentRow {
    id: Uuid,
    recipe_id: Uuid,
    product_id: Uuid,
    quantity_per_batch: Decimal,
    unit: String,
}

impl From<ComponentRow> for RecipeComponent {
    fn from(row: ComponentRow) -> Self {
        RecipeComponent {
            id: row.id,
            recipe_id: row.recipe_id,
            product_id: row.product_id,
            quantity_per_batch: row.quantity_per_batch,
            unit: row.unit,
        }
    }
}

impl PgCatalog {
    /// Create a new PgCatalog instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogReader for PgCatalog {
    async fn recipe_by_id(&self, id: Uuid) -> AppResult<Option<RecipeWithComponents>> {
        let recipe = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, code, name, created_at FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        let Some((id, code, name, created_at)) = recipe else {
            return Ok(None);
        };

        let components = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, recipe_id, product_id, quantity_per_batch, unit
            FROM recipe_components
            WHERE recipe_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(RecipeWithComponents {
            recipe: Recipe {
                id,
                code,
                name,
                created_at,
            },
            components: components.into_iter().map(RecipeComponent::from).collect(),
        }))
    }

    async fn product_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, code, name, unit, quantity_available, expires_at, lot_code,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn products_by_code(&self, code: &str) -> AppResult<Vec<Product>> {
        // Nulls-last ordering is spelled out rather than left to the engine
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, code, name, unit, quantity_available, expires_at, lot_code,
                   created_at, updated_at
            FROM products
            WHERE code = $1
            ORDER BY expires_at ASC NULLS LAST, id ASC
            "#,
        )
        .bind(code)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }
}
