//! HTTP handlers for recipe endpoints

use axum::{extract::State, Json};

use shared::models::RecipeWithComponents;

use crate::error::AppResult;
use crate::services::RecipeService;
use crate::AppState;

/// List every recipe with its components
pub async fn list_recipes(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RecipeWithComponents>>> {
    let service = RecipeService::new(state.db);
    let recipes = service.list_recipes().await?;
    Ok(Json(recipes))
}
