//! HTTP handlers for stock consolidation endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::reconciliation::{
    CommitConsolidationInput, CommitResult, ReasonSummary, ReconciliationService,
};
use crate::AppState;
use shared::models::StockAdjustment;
use shared::reconciliation::StockSnapshot;
use shared::types::DateRange;

/// Build stock snapshots for every counted ingredient
pub async fn get_stock_snapshots(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StockSnapshot>>> {
    let service = ReconciliationService::new(state.db);
    let snapshots = service.snapshots().await?;
    Ok(Json(snapshots))
}

/// Commit a consolidation session
pub async fn commit_consolidation(
    State(state): State<AppState>,
    Json(input): Json<CommitConsolidationInput>,
) -> AppResult<Json<CommitResult>> {
    let service = ReconciliationService::new(state.db);
    let result = service.commit(input).await?;
    Ok(Json(result))
}

/// Query parameters for the adjustment history
#[derive(Debug, Deserialize)]
pub struct AdjustmentHistoryQuery {
    pub ingredient_id: Option<Uuid>,
}

/// List adjustment audit rows, newest first
pub async fn list_adjustments(
    State(state): State<AppState>,
    Query(query): Query<AdjustmentHistoryQuery>,
) -> AppResult<Json<Vec<StockAdjustment>>> {
    let service = ReconciliationService::new(state.db);
    let adjustments = service.list_adjustments(query.ingredient_id).await?;
    Ok(Json(adjustments))
}

/// Net variance per reason over a date range
pub async fn get_variance_summary(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> AppResult<Json<Vec<ReasonSummary>>> {
    let service = ReconciliationService::new(state.db);
    let summary = service.variance_summary(range).await?;
    Ok(Json(summary))
}
