//! Feasibility request and report models
//!
//! The wire field names follow the production-planning API contract, which
//! keeps the Spanish vocabulary of the plant floor (`recetas`, `cantidad`,
//! `puede_producir`). Rust-side names stay English like the rest of the code.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A batch of production requests submitted for a feasibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRequest {
    #[serde(rename = "recetas")]
    pub recipes: Vec<RecipeRequest>,
}

/// One requested recipe run: produce `batches` times the recipe output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub id: Uuid,
    #[serde(rename = "cantidad")]
    pub batches: Decimal,
}

/// Per-product verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeasibilityStatus {
    #[serde(rename = "suficiente")]
    Sufficient,
    #[serde(rename = "insuficiente")]
    Insufficient,
}

/// Consumption of a single lot in an allocation plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotAllocation {
    /// Lot code, or `"sin lote"` for stock without one
    #[serde(rename = "lote")]
    pub lot: String,
    #[serde(rename = "cantidad")]
    pub quantity: Decimal,
    /// Expiry formatted `YYYY-MM-DD`, or `"N/A"` for undated lots
    #[serde(rename = "vencimiento")]
    pub expires: String,
}

/// Feasibility verdict for one aggregated product requirement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFeasibility {
    #[serde(rename = "producto")]
    pub product: String,
    #[serde(rename = "codigo", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "necesario")]
    pub required: Decimal,
    #[serde(rename = "disponible")]
    pub available: Decimal,
    #[serde(rename = "estado")]
    pub status: FeasibilityStatus,
    /// True when any lot of the product expires inside the configured window
    #[serde(rename = "por_vencer")]
    pub near_expiry: bool,
    /// Missing quantity, present only when insufficient
    #[serde(rename = "faltante", skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Decimal>,
    /// Oldest-expiry-first consumption plan, present only when sufficient
    #[serde(rename = "lotes_a_usar", skip_serializing_if = "Option::is_none")]
    pub lots_to_use: Option<Vec<LotAllocation>>,
}

/// The full report for one batch of production requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityReport {
    /// AND of every per-product verdict; an empty request is trivially feasible
    #[serde(rename = "puede_producir")]
    pub can_produce: bool,
    #[serde(rename = "detalles")]
    pub details: Vec<ProductFeasibility>,
}
