//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles through the router, the cache and the
//! in-memory entity store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use user_cache::{
    api::create_router,
    models::User,
    repository::{MemoryUserStore, UserStore},
    AppState, Config,
};

// == Helper Functions ==

const KNOWN_ID: &str = "5f0c6a8e-3b7d-4d3a-9a51-8e2f4c1b9d70";

fn create_test_app() -> (Router, Arc<MemoryUserStore>) {
    let repo = Arc::new(MemoryUserStore::new());
    let state = AppState::new(repo.clone(), &Config::default());
    (create_router(state), repo)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// == CRUD Lifecycle ==

#[tokio::test]
async fn test_user_lifecycle() {
    let (app, _repo) = create_test_app();

    let (status, created) = send(&app, "POST", "/user", Some(r#"{"name":"Ada","age":36}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, user) = send(&app, "GET", &format!("/user/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["age"], 36);

    let update = format!(r#"{{"id":"{}","name":"Ada L.","age":37}}"#, id);
    let (status, _) = send(&app, "PUT", "/user", Some(&update)).await;
    assert_eq!(status, StatusCode::OK);

    // Write-through: the refreshed value is visible immediately
    let (_, user) = send(&app, "GET", &format!("/user/{}", id), None).await;
    assert_eq!(user["name"], "Ada L.");
    assert_eq!(user["age"], 37);

    let (status, deleted) = send(&app, "DELETE", &format!("/user/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(deleted["message"].as_str().unwrap().contains(&id));

    let (status, body) = send(&app, "GET", &format!("/user/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_list_endpoint_paginates() {
    let (app, repo) = create_test_app();
    for (id, name) in [("a", "A"), ("b", "B"), ("c", "C")] {
        repo.insert(User::new(id, name, 20)).await;
    }

    let (status, page) = send(&app, "GET", "/users?limit=2&offset=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b", "c"]);

    let (status, page) = send(&app, "GET", "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().unwrap().len(), 3);
}

// == Cache Behavior ==

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let (app, repo) = create_test_app();
    repo.insert(User::new(KNOWN_ID, "A", 30)).await;

    let uri = format!("/user/{}", KNOWN_ID);
    send(&app, "GET", &uri, None).await; // miss
    send(&app, "GET", &uri, None).await; // hit
    send(&app, "GET", &uri, None).await; // hit

    let (status, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["hits"], 2);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_entries"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_cached_value_served_until_ttl_elapses() {
    let (app, repo) = create_test_app();
    repo.insert(User::new(KNOWN_ID, "A", 30)).await;
    let uri = format!("/user/{}", KNOWN_ID);

    let (_, user) = send(&app, "GET", &uri, None).await;
    assert_eq!(user["age"], 30);

    // Changed behind the cache's back; the cached copy is still fresh
    repo.insert(User::new(KNOWN_ID, "A", 31)).await;
    let (_, user) = send(&app, "GET", &uri, None).await;
    assert_eq!(user["age"], 30);

    // Default TTL is ten minutes
    tokio::time::advance(Duration::from_secs(11 * 60)).await;
    let (_, user) = send(&app, "GET", &uri, None).await;
    assert_eq!(user["age"], 31);
}

// == Validation ==

#[tokio::test]
async fn test_malformed_id_rejected() {
    let (app, _repo) = create_test_app();

    let (status, body) = send(&app, "GET", "/user/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("UUID"));

    let (status, _) = send(&app, "DELETE", "/user/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_create_payloads() {
    let (app, repo) = create_test_app();

    let (status, _) = send(&app, "POST", "/user", Some(r#"{"name":"","age":20}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/user", Some(r#"{"name":"Old","age":151}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/user", Some("{not json")).await;
    assert!(status.is_client_error());

    assert!(repo.list(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_unknown_user_not_found() {
    let (app, _repo) = create_test_app();

    let update = format!(r#"{{"id":"{}","name":"Ghost","age":1}}"#, KNOWN_ID);
    let (status, _) = send(&app, "PUT", "/user", Some(&update)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _repo) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
