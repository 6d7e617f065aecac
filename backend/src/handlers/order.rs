//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::order::{
    ConfirmReceiptInput, CreateOrderInput, OrderService, PurchaseOrderWithItems, ReceiptResult,
};
use crate::AppState;
use shared::models::PurchaseOrder;

/// Place a purchase order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = OrderService::new(state.db);
    let order = service.create(input).await?;
    Ok(Json(order))
}

/// List all purchase orders
pub async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let service = OrderService::new(state.db);
    let orders = service.list().await?;
    Ok(Json(orders))
}

/// Get a purchase order with its line items
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = OrderService::new(state.db);
    let order = service.get(order_id).await?;
    Ok(Json(order))
}

/// Confirm the receipt of a pending order
pub async fn confirm_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ConfirmReceiptInput>,
) -> AppResult<Json<ReceiptResult>> {
    let service = OrderService::new(state.db);
    let result = service.confirm_receipt(order_id, input).await?;
    Ok(Json(result))
}
