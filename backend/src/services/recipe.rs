//! Recipe catalog service

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Recipe, RecipeComponent, RecipeWithComponents};

use crate::error::AppResult;

/// Recipe service for catalog queries
#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
}

/// Row for component listing queries
#[derive(Debug, FromRow)]
struct ComponentRow {
    id: Uuid,
    recipe_id: Uuid,
    product_id: Uuid,
    quantity_per_batch: Decimal,
    unit: String,
}

impl RecipeService {
    /// Create a new RecipeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List every recipe together with its components
    pub async fn list_recipes(&self) -> AppResult<Vec<RecipeWithComponents>> {
        let recipes = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, code, name, created_at FROM recipes ORDER BY code ASC",
        )
        .fetch_all(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, recipe_id, product_id, quantity_per_batch, unit
            FROM recipe_components
            ORDER BY recipe_id, position, id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut components: HashMap<Uuid, Vec<RecipeComponent>> = HashMap::new();
        for row in rows {
            components
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeComponent {
                    id: row.id,
                    recipe_id: row.recipe_id,
                    product_id: row.product_id,
                    quantity_per_batch: row.quantity_per_batch,
                    unit: row.unit,
                });
        }

        Ok(recipes
            .into_iter()
            .map(|(id, code, name, created_at)| RecipeWithComponents {
                components: components.remove(&id).unwrap_or_default(),
                recipe: Recipe {
                    id,
                    code,
                    name,
                    created_at,
                },
            })
            .collect())
    }
}
