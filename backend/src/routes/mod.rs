//! Route definitions for the Batch Production Planner

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock
        .nest("/products", product_routes())
        // Recipe catalog
        .nest("/recipes", recipe_routes())
        // Feasibility engine
        .nest("/production", production_routes())
        // CSV imports
        .nest("/imports", import_routes())
}

/// Stock routes
fn product_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_products).delete(handlers::clear_stock),
    )
}

/// Recipe catalog routes
fn recipe_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_recipes))
}

/// Production planning routes
fn production_routes() -> Router<AppState> {
    Router::new().route("/feasibility", post(handlers::compute_feasibility))
}

/// Import routes
fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", post(handlers::import_inventory))
        .route("/recipes", post(handlers::import_recipes))
}
