//! API Handlers
//!
//! HTTP request handlers for each user service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::cache::{CacheMetrics, CacheStats, CachedUserStore, FanoutMetrics};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::requests::validate_id;
use crate::models::{
    CreateUserRequest, DeleteResponse, HealthResponse, IdResponse, ListQuery, StatsResponse,
    UpdateUserRequest, User,
};
use crate::repository::UserStore;
use crate::telemetry::PrometheusMetrics;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached view of the entity store
    pub users: Arc<CachedUserStore>,
    /// Counters fed by the cache
    pub stats: Arc<CacheStats>,
    /// Renders the Prometheus exposition; `/metrics` answers 404 without it
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Wraps `repo` in a cache that reports both to a fresh set of counters
    /// and to the Prometheus cache counters.
    pub fn new(repo: Arc<dyn UserStore>, config: &Config) -> Self {
        let stats = Arc::new(CacheStats::new());
        let metrics: Arc<dyn CacheMetrics> = Arc::new(FanoutMetrics::new(vec![
            stats.clone(),
            Arc::new(PrometheusMetrics),
        ]));
        let users = Arc::new(CachedUserStore::new(repo, config.ttl(), metrics));
        Self {
            users,
            stats,
            prometheus: None,
        }
    }

    /// Serves `handle` on `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

fn ensure_valid_id(id: &str) -> Result<()> {
    match validate_id(id) {
        Some(msg) => Err(Error::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for POST /user
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<IdResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(Error::InvalidRequest(error_msg));
    }

    let id = state.users.create(req.into_new_user()).await?;

    Ok((StatusCode::CREATED, Json(IdResponse::new(id))))
}

/// Handler for PUT /user
pub async fn update_user_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<IdResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(Error::InvalidRequest(error_msg));
    }

    let user = req.into_user();
    state.users.update(&user).await?;

    Ok(Json(IdResponse::new(user.id)))
}

/// Handler for GET /user/:id
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    ensure_valid_id(&id)?;
    let user = state.users.get(&id).await?;
    Ok(Json(user))
}

/// Handler for DELETE /user/:id
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    ensure_valid_id(&id)?;
    state.users.delete(&id).await?;
    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for GET /users?limit=&offset=
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<User>>> {
    let (limit, offset) = query.resolve().map_err(Error::InvalidRequest)?;
    let users = state.users.list(limit, offset).await?;
    Ok(Json(users))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let entries = state.users.cached_entries().await;
    Json(StatsResponse::new(state.stats.snapshot(), entries))
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String> {
    let handle = state
        .prometheus
        .as_ref()
        .ok_or_else(|| Error::NotFound("metrics exporter is not installed".to_string()))?;
    Ok(handle.render())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
