//! API Routes
//!
//! Configures the Axum router with all user service endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_user_handler, delete_user_handler, get_user_handler, health_handler,
    list_users_handler, metrics_handler, stats_handler, update_user_handler, AppState,
};
use crate::telemetry::{track_http_metrics, METRICS_PATH};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /user` - Create a user
/// - `PUT /user` - Update a user
/// - `GET /user/:id` - Fetch a user (cached)
/// - `DELETE /user/:id` - Delete a user
/// - `GET /users` - List users with `limit`/`offset`
/// - `GET /stats` - Cache statistics
/// - `GET /metrics` - Prometheus exposition
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Metrics: Counts and times every routed request except `/metrics`
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/user", post(create_user_handler).put(update_user_handler))
        .route("/user/:id", get(get_user_handler).delete(delete_user_handler))
        .route("/users", get(list_users_handler))
        .route("/stats", get(stats_handler))
        .route(METRICS_PATH, get(metrics_handler))
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn(track_http_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
