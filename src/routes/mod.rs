pub mod formats;
pub mod health;
pub mod reports;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/reports", post(reports::create_report))
        .route("/api/reports/sales", post(reports::create_sales_report))
        .route(
            "/api/reports/inventory",
            post(reports::create_inventory_report),
        )
        .route(
            "/api/reports/financial",
            post(reports::create_financial_report),
        )
        .route("/api/reports/options", get(reports::list_options))
        .route("/api/reports/history", get(reports::list_history))
        .route("/api/formats/{format}", post(formats::preview_format))
        .with_state(state)
}
