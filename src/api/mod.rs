use crate::state::AppState;
use axum::Router;
use axum::routing::{get, put};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/sensors", get(handlers::get_sensors))
        .route("/api/cleaning-schedule", get(handlers::get_cleaning_schedule))
        .route(
            "/api/cleaning-schedule/last-cleaned",
            put(handlers::put_last_cleaned),
        )
        .with_state(state)
}
