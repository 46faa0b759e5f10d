//! Recipe and component models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bill-of-materials recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One component line of a recipe
///
/// `product_id` points at the specific product row the component was anchored
/// to at import time (the reference product). The feasibility engine resolves
/// it only to obtain the product code; stock is drawn from every lot sharing
/// that code. The reference may dangle after stock is cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeComponent {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub product_id: Uuid,
    /// Quantity required per one batch of recipe output, always positive
    pub quantity_per_batch: Decimal,
    /// Unit string as imported, not normalized
    pub unit: String,
}

/// A recipe together with its component lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeWithComponents {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub components: Vec<RecipeComponent>,
}
