//! HTTP handlers for ingredient management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ingredient::{
    CreateIngredientInput, IngredientService, RecordConsumptionInput, RecordCountInput,
    StockValuation, UpdateIngredientInput,
};
use crate::AppState;
use shared::models::Ingredient;

/// Create an ingredient
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(input): Json<CreateIngredientInput>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.db);
    let ingredient = service.create(input).await?;
    Ok(Json(ingredient))
}

/// List all ingredients
pub async fn list_ingredients(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    let service = IngredientService::new(state.db);
    let ingredients = service.list().await?;
    Ok(Json(ingredients))
}

/// Get an ingredient by id
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.db);
    let ingredient = service.get(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// Update an ingredient's master data
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(input): Json<UpdateIngredientInput>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.db);
    let ingredient = service.update(ingredient_id, input).await?;
    Ok(Json(ingredient))
}

/// Delete an ingredient
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = IngredientService::new(state.db);
    service.delete(ingredient_id).await?;
    Ok(Json(()))
}

/// Enter a physical count for an ingredient
pub async fn record_count(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(input): Json<RecordCountInput>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.db);
    let ingredient = service.record_count(ingredient_id, input).await?;
    Ok(Json(ingredient))
}

/// Record recipe-driven consumption (a sale)
pub async fn record_consumption(
    State(state): State<AppState>,
    Json(input): Json<RecordConsumptionInput>,
) -> AppResult<Json<()>> {
    let service = IngredientService::new(state.db);
    service.record_consumption(input).await?;
    Ok(Json(()))
}

/// List ingredients below their minimum stock threshold
pub async fn list_low_stock(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    let service = IngredientService::new(state.db);
    let ingredients = service.list_low_stock().await?;
    Ok(Json(ingredients))
}

/// Get the valuation of the whole inventory
pub async fn get_stock_valuation(State(state): State<AppState>) -> AppResult<Json<StockValuation>> {
    let service = IngredientService::new(state.db);
    let valuation = service.get_valuation().await?;
    Ok(Json(valuation))
}
