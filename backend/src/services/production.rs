//! Production feasibility engine
//!
//! Aggregates component requirements across the requested recipes, checks
//! them against every stock lot of each product, and builds an
//! oldest-expiry-first consumption plan. Read-only: the engine reports what a
//! run would consume, it never deducts stock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    FeasibilityReport, FeasibilityStatus, LotAllocation, Product, ProductFeasibility,
    RecipeRequest,
};
use shared::validation::validate_batch_count;

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogReader;

/// Label reported for stock registered without a lot code
pub const NO_LOT_LABEL: &str = "sin lote";

/// Label reported for lots without an expiry date
pub const NO_EXPIRY_LABEL: &str = "N/A";

/// Entries dropped from a feasibility run because the catalog no longer
/// contains what they reference
///
/// Stale references are tolerated (imports and stock clears can leave them
/// behind), but never swallowed without a visible count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkippedEntries {
    /// Requests naming a recipe id the catalog does not know
    pub unknown_recipes: u32,
    /// Aggregated requirements whose reference product row is gone
    pub missing_products: u32,
}

impl SkippedEntries {
    pub fn is_empty(&self) -> bool {
        self.unknown_recipes == 0 && self.missing_products == 0
    }
}

/// Production feasibility engine over an injected catalog
pub struct FeasibilityService<C> {
    catalog: C,
    near_expiry_days: i64,
}

impl<C: CatalogReader> FeasibilityService<C> {
    /// Create a new FeasibilityService instance
    pub fn new(catalog: C, near_expiry_days: i64) -> Self {
        Self {
            catalog,
            near_expiry_days,
        }
    }

    /// Check whether the requested production run is feasible
    ///
    /// Totals are accumulated per reference product across all requests
    /// before any availability check, so two recipes sharing an ingredient
    /// compete for the same stock. Detail entries come back in first-seen
    /// order.
    pub async fn compute(
        &self,
        requests: &[RecipeRequest],
    ) -> AppResult<(FeasibilityReport, SkippedEntries)> {
        for request in requests {
            validate_batch_count(request.batches).map_err(|message| AppError::Validation {
                field: "cantidad".to_string(),
                message: message.to_string(),
                message_es: "La cantidad debe ser un número positivo".to_string(),
            })?;
        }

        let mut skipped = SkippedEntries::default();

        // Total requirement per reference product row, in first-seen order
        let mut order: Vec<Uuid> = Vec::new();
        let mut required: HashMap<Uuid, Decimal> = HashMap::new();

        for request in requests {
            let recipe = match self.catalog.recipe_by_id(request.id).await? {
                Some(recipe) => recipe,
                None => {
                    skipped.unknown_recipes += 1;
                    tracing::warn!(
                        recipe_id = %request.id,
                        "feasibility request references unknown recipe, skipping"
                    );
                    continue;
                }
            };

            for component in &recipe.components {
                let needed = component.quantity_per_batch * request.batches;
                match required.entry(component.product_id) {
                    Entry::Occupied(mut entry) => *entry.get_mut() += needed,
                    Entry::Vacant(entry) => {
                        entry.insert(needed);
                        order.push(component.product_id);
                    }
                }
            }
        }

        let today = Utc::now().date_naive();
        let mut can_produce = true;
        let mut details = Vec::with_capacity(order.len());

        for product_id in order {
            let needed = required[&product_id];

            // The reference row only resolves the code; stock is drawn from
            // every lot sharing it
            let reference = match self.catalog.product_by_id(product_id).await? {
                Some(product) => product,
                None => {
                    skipped.missing_products += 1;
                    tracing::warn!(
                        product_id = %product_id,
                        "component references a missing product, skipping requirement"
                    );
                    continue;
                }
            };

            let pool = self.catalog.products_by_code(&reference.code).await?;

            let available: Decimal = pool.iter().map(|lot| lot.quantity_available).sum();
            let near_expiry = pool
                .iter()
                .any(|lot| lot.is_near_expiry(today, self.near_expiry_days));
            let display_name = pool
                .first()
                .map(|lot| lot.name.clone())
                .unwrap_or_else(|| reference.name.clone());

            if available < needed {
                can_produce = false;
                details.push(ProductFeasibility {
                    product: display_name,
                    code: Some(reference.code),
                    required: needed,
                    available,
                    status: FeasibilityStatus::Insufficient,
                    near_expiry,
                    shortfall: Some(needed - available),
                    lots_to_use: None,
                });
            } else {
                details.push(ProductFeasibility {
                    product: display_name,
                    code: Some(reference.code),
                    required: needed,
                    available,
                    status: FeasibilityStatus::Sufficient,
                    near_expiry,
                    shortfall: None,
                    lots_to_use: Some(allocate_lots(&pool, needed)),
                });
            }
        }

        Ok((
            FeasibilityReport {
                can_produce,
                details,
            },
            skipped,
        ))
    }
}

/// Build the oldest-expiry-first consumption plan for one requirement
///
/// `pool` must already be ordered by expiry ascending with undated lots last
/// (the [`CatalogReader::products_by_code`] contract). The walk stops as soon
/// as the requirement is covered, so consumed quantities always sum to
/// exactly `needed` when the pool suffices.
pub fn allocate_lots(pool: &[Product], needed: Decimal) -> Vec<LotAllocation> {
    let mut remaining = needed;
    let mut allocations = Vec::new();

    for lot in pool {
        if remaining <= Decimal::ZERO {
            break;
        }

        let take = lot.quantity_available.min(remaining);
        allocations.push(LotAllocation {
            lot: lot
                .lot_code
                .clone()
                .unwrap_or_else(|| NO_LOT_LABEL.to_string()),
            quantity: take,
            expires: lot
                .expires_at
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NO_EXPIRY_LABEL.to_string()),
        });
        remaining -= take;
    }

    allocations
}
