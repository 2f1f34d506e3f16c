use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, pool, purchases};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Pool
        .route("/pool", get(pool::get_pool))
        .route("/tickets", get(pool::list_tickets))
        // Purchases
        .route("/purchases", post(purchases::submit_purchase))
        .route("/outcomes", get(purchases::list_outcomes))
        .route("/dispatcher", get(purchases::get_dispatcher_status));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
