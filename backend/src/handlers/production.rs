//! HTTP handler for the production feasibility endpoint

use axum::{extract::State, Json};

use shared::models::{FeasibilityReport, ProductionRequest};

use crate::error::AppResult;
use crate::services::{FeasibilityService, PgCatalog};
use crate::AppState;

/// Compute whether the requested production run is feasible
pub async fn compute_feasibility(
    State(state): State<AppState>,
    Json(input): Json<ProductionRequest>,
) -> AppResult<Json<FeasibilityReport>> {
    let service = FeasibilityService::new(
        PgCatalog::new(state.db),
        state.config.production.near_expiry_days,
    );

    let (report, skipped) = service.compute(&input.recipes).await?;

    if !skipped.is_empty() {
        tracing::info!(
            unknown_recipes = skipped.unknown_recipes,
            missing_products = skipped.missing_products,
            "feasibility computed with stale catalog references"
        );
    }

    Ok(Json(report))
}
