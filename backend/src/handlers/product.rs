//! HTTP handlers for stock endpoints

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use shared::models::Product;

use crate::error::AppResult;
use crate::services::ProductService;
use crate::AppState;

/// A stock lot with its computed near-expiry flag
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub near_expiry: bool,
}

/// Response for the clear-stock operation
#[derive(Debug, Serialize)]
pub struct ClearStockResponse {
    pub deleted: u64,
}

/// List every stock lot
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<ProductView>>> {
    let service = ProductService::new(state.db);
    let products = service.list_products().await?;

    let today = Utc::now().date_naive();
    let window = state.config.production.near_expiry_days;

    let views = products
        .into_iter()
        .map(|product| ProductView {
            near_expiry: product.is_near_expiry(today, window),
            product,
        })
        .collect();

    Ok(Json(views))
}

/// Delete all stock lots
pub async fn clear_stock(State(state): State<AppState>) -> AppResult<Json<ClearStockResponse>> {
    let service = ProductService::new(state.db);
    let deleted = service.clear_stock().await?;

    tracing::info!(deleted, "stock cleared");

    Ok(Json(ClearStockResponse { deleted }))
}
