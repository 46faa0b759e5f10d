//! HTTP handlers for CSV upload endpoints

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::services::import::{
    parse_inventory_csv, parse_recipes_csv, InventoryImportSummary, RecipeImportSummary,
};
use crate::services::ImportService;
use crate::AppState;

/// Upload an inventory export and upsert its stock lots
pub async fn import_inventory(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<InventoryImportSummary>> {
    let (filename, data) = read_csv_part(&mut multipart).await?;
    let (rows, skipped) = parse_inventory_csv(&data)?;

    let service = ImportService::new(state.db);
    let summary = service.import_inventory(rows, skipped).await?;

    tracing::info!(
        file = %filename,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "inventory import finished"
    );

    Ok(Json(summary))
}

/// Upload a recipes file and upsert its definitions
pub async fn import_recipes(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<RecipeImportSummary>> {
    let (filename, data) = read_csv_part(&mut multipart).await?;
    let parsed = parse_recipes_csv(&data)?;

    let service = ImportService::new(state.db);
    let summary = service.import_recipes(parsed).await?;

    tracing::info!(
        file = %filename,
        created = summary.created,
        updated = summary.updated,
        "recipes import finished"
    );

    Ok(Json(summary))
}

/// Pull the uploaded CSV out of a multipart body
async fn read_csv_part(multipart: &mut Multipart) -> AppResult<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        if !filename.to_lowercase().ends_with(".csv") {
            return Err(AppError::UnsupportedFile(filename));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        return Ok((filename, data));
    }

    Err(AppError::ValidationError(
        "no 'file' part in the upload".to_string(),
    ))
}
