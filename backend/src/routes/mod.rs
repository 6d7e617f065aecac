//! Route definitions for the Restaurant Stock Management Platform

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
        // Ingredient master data and running stock
        .nest("/ingredients", ingredient_routes())
        // Stock consolidation (virtual vs. real reconciliation)
        .nest("/reconciliation", reconciliation_routes())
        // Purchase orders and receiving
        .nest("/orders", order_routes())
}

/// Ingredient management routes
fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/valuation", get(handlers::get_stock_valuation))
        .route("/consumption", post(handlers::record_consumption))
        .route(
            "/:ingredient_id",
            get(handlers::get_ingredient)
                .put(handlers::update_ingredient)
                .delete(handlers::delete_ingredient),
        )
        .route("/:ingredient_id/count", post(handlers::record_count))
}

/// Stock consolidation routes
fn reconciliation_routes() -> Router<AppState> {
    Router::new()
        .route("/snapshots", get(handlers::get_stock_snapshots))
        .route("/commit", post(handlers::commit_consolidation))
        .route("/adjustments", get(handlers::list_adjustments))
        .route("/adjustments/summary", get(handlers::get_variance_summary))
}

/// Purchase order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route("/:order_id/receipt", post(handlers::confirm_receipt))
}
