//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
}

fn health_response(database_connected: bool) -> HealthResponse {
    HealthResponse {
        status: if database_connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        service: "restaurant-stock-management".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_connected {
            "connected".to_string()
        } else {
            "disconnected".to_string()
        },
    }
}

/// Readiness probe: reports the service identity and whether the stock
/// database is reachable
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    Json(health_response(database_connected))
}
