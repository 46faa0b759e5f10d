//! CSV import pipeline for stock snapshots and recipe definitions
//!
//! Two file shapes are supported. Inventory files are ERP stock exports with
//! preamble rows and positional columns; parsing is lenient and skips rows it
//! cannot use. Recipe files are plain headered CSVs; malformed rows fail the
//! whole import.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::Unit;
use shared::units::{normalize_measurement, normalize_unit};
use shared::validation::validate_component_quantity;

use crate::error::{AppError, AppResult};

/// Marker cell that opens the product table in an inventory export
const HEADER_MARKER: &str = "Artículo";

// Positional layout of an inventory export after the marker row:
// _, code, _, name, lot, expiry, state (ignored), unit, quantity, total (ignored)
const COL_CODE: usize = 1;
const COL_NAME: usize = 3;
const COL_LOT: usize = 4;
const COL_EXPIRY: usize = 5;
const COL_UNIT: usize = 7;
const COL_QUANTITY: usize = 8;

/// One cleaned inventory row ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub code: String,
    pub name: String,
    pub lot_code: Option<String>,
    pub expires_at: Option<NaiveDate>,
    pub unit: Unit,
    pub quantity: Decimal,
}

/// Outcome of an inventory import
#[derive(Debug, Serialize)]
pub struct InventoryImportSummary {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
}

/// Outcome of a recipes import
#[derive(Debug, Serialize)]
pub struct RecipeImportSummary {
    pub created: u32,
    pub updated: u32,
}

/// A recipe definition parsed from an import file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecipe {
    pub code: String,
    pub name: String,
    pub components: Vec<ParsedComponent>,
}

/// One component line of a parsed recipe
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedComponent {
    pub product_code: String,
    pub quantity: Decimal,
    pub unit: String,
}

/// Raw row shape of a recipes CSV
#[derive(Debug, Deserialize)]
struct RecipeCsvRow {
    codigo_receta: String,
    nombre_receta: String,
    codigo_producto: String,
    cantidad: Decimal,
    unidad: String,
}

/// Parse an inventory export into cleaned rows
///
/// Returns the rows plus the count of product rows that were dropped
/// (unparseable quantity or unknown unit). Rows before the marker and rows
/// without a product code are structural noise, not counted.
pub fn parse_inventory_csv(data: &[u8]) -> AppResult<(Vec<InventoryRow>, u32)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    let mut skipped = 0u32;
    let mut in_products = false;

    for record in reader.records() {
        let record = record.map_err(|e| AppError::InvalidImport(e.to_string()))?;

        if !in_products {
            if record.iter().any(|cell| cell.contains(HEADER_MARKER)) {
                in_products = true;
            }
            continue;
        }

        let code = record.get(COL_CODE).map(str::trim).unwrap_or("");
        if code.is_empty() {
            continue;
        }

        let quantity = record
            .get(COL_QUANTITY)
            .map(str::trim)
            .and_then(|s| Decimal::from_str(s).ok());
        let Some(quantity) = quantity else {
            skipped += 1;
            continue;
        };

        let raw_unit = record.get(COL_UNIT).map(str::trim).unwrap_or("");
        let Some((unit, quantity)) = normalize_measurement(quantity, raw_unit) else {
            skipped += 1;
            tracing::warn!(code, unit = raw_unit, "unknown unit in inventory import, skipping row");
            continue;
        };

        let name = record
            .get(COL_NAME)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(code)
            .to_string();
        let lot_code = record
            .get(COL_LOT)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        let expires_at = record.get(COL_EXPIRY).and_then(parse_expiry);

        rows.push(InventoryRow {
            code: code.to_string(),
            name,
            lot_code,
            expires_at,
            unit,
            quantity,
        });
    }

    if !in_products {
        return Err(AppError::InvalidImport(
            "no product table header found".to_string(),
        ));
    }

    Ok((rows, skipped))
}

/// Parse an expiry cell, coercing anything unreadable to `None`
fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Parse a recipes CSV into grouped definitions, preserving file order
///
/// Rows missing either code are skipped; malformed numbers fail the import,
/// and a non-positive component quantity is a validation error.
pub fn parse_recipes_csv(data: &[u8]) -> AppResult<Vec<ParsedRecipe>> {
    let mut reader = csv::Reader::from_reader(data);

    let mut recipes: Vec<ParsedRecipe> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in reader.deserialize::<RecipeCsvRow>() {
        let row = row.map_err(|e| AppError::InvalidImport(e.to_string()))?;

        let recipe_code = row.codigo_receta.trim().to_string();
        let product_code = row.codigo_producto.trim().to_string();
        if recipe_code.is_empty() || product_code.is_empty() {
            continue;
        }

        validate_component_quantity(row.cantidad).map_err(|message| AppError::Validation {
            field: "cantidad".to_string(),
            message: message.to_string(),
            message_es: "La cantidad del componente debe ser positiva".to_string(),
        })?;

        let slot = *index.entry(recipe_code.clone()).or_insert_with(|| {
            recipes.push(ParsedRecipe {
                code: recipe_code.clone(),
                name: row.nombre_receta.trim().to_string(),
                components: Vec::new(),
            });
            recipes.len() - 1
        });

        recipes[slot].components.push(ParsedComponent {
            product_code,
            quantity: row.cantidad,
            unit: row.unidad.trim().to_string(),
        });
    }

    Ok(recipes)
}

/// Import service for persisting parsed files
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
}

impl ImportService {
    /// Create a new ImportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert cleaned inventory rows, matching existing stock by (code, lot)
    pub async fn import_inventory(
        &self,
        rows: Vec<InventoryRow>,
        skipped: u32,
    ) -> AppResult<InventoryImportSummary> {
        let mut created = 0u32;
        let mut updated = 0u32;

        for row in rows {
            let existing = sqlx::query_scalar::<_, Uuid>(
                r#"
                SELECT id FROM products
                WHERE code = $1 AND lot_code IS NOT DISTINCT FROM $2
                ORDER BY created_at ASC
                LIMIT 1
                "#,
            )
            .bind(&row.code)
            .bind(&row.lot_code)
            .fetch_optional(&self.db)
            .await?;

            match existing {
                Some(id) => {
                    sqlx::query(
                        r#"
                        UPDATE products
                        SET name = $1, unit = $2, quantity_available = $3, expires_at = $4,
                            updated_at = now()
                        WHERE id = $5
                        "#,
                    )
                    .bind(&row.name)
                    .bind(row.unit.as_str())
                    .bind(row.quantity)
                    .bind(row.expires_at)
                    .bind(id)
                    .execute(&self.db)
                    .await?;
                    updated += 1;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO products (code, name, unit, quantity_available, expires_at, lot_code)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(&row.code)
                    .bind(&row.name)
                    .bind(row.unit.as_str())
                    .bind(row.quantity)
                    .bind(row.expires_at)
                    .bind(&row.lot_code)
                    .execute(&self.db)
                    .await?;
                    created += 1;
                }
            }
        }

        Ok(InventoryImportSummary {
            created,
            updated,
            skipped,
        })
    }

    /// Upsert parsed recipe definitions, replacing components wholesale
    pub async fn import_recipes(
        &self,
        parsed: Vec<ParsedRecipe>,
    ) -> AppResult<RecipeImportSummary> {
        let mut created = 0u32;
        let mut updated = 0u32;

        for recipe in parsed {
            let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM recipes WHERE code = $1")
                .bind(&recipe.code)
                .fetch_optional(&self.db)
                .await?;

            let recipe_id = match existing {
                Some(id) => {
                    sqlx::query("UPDATE recipes SET name = $1 WHERE id = $2")
                        .bind(&recipe.name)
                        .bind(id)
                        .execute(&self.db)
                        .await?;
                    sqlx::query("DELETE FROM recipe_components WHERE recipe_id = $1")
                        .bind(id)
                        .execute(&self.db)
                        .await?;
                    updated += 1;
                    id
                }
                None => {
                    let id = sqlx::query_scalar::<_, Uuid>(
                        "INSERT INTO recipes (code, name) VALUES ($1, $2) RETURNING id",
                    )
                    .bind(&recipe.code)
                    .bind(&recipe.name)
                    .fetch_one(&self.db)
                    .await?;
                    created += 1;
                    id
                }
            };

            for (position, component) in recipe.components.iter().enumerate() {
                let product_id = self
                    .resolve_component_product(&component.product_code, &component.unit)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO recipe_components (recipe_id, product_id, quantity_per_batch, unit, position)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(recipe_id)
                .bind(product_id)
                .bind(component.quantity)
                .bind(&component.unit)
                .bind(position as i32)
                .execute(&self.db)
                .await?;
            }
        }

        Ok(RecipeImportSummary { created, updated })
    }

    /// Find the product row a component should anchor to, creating a master
    /// placeholder (quantity zero, no lot) when the code is new
    async fn resolve_component_product(&self, code: &str, raw_unit: &str) -> AppResult<Uuid> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM products WHERE code = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let unit = normalize_unit(raw_unit).unwrap_or(Unit::Units);

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products (code, name, unit, quantity_available)
            VALUES ($1, $1, $2, 0)
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(unit.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(id)
    }
}
