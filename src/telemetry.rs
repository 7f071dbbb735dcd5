//! Prometheus metrics for the cache and the HTTP API.
//!
//! Cache signals reach Prometheus through [`PrometheusMetrics`]; request
//! counts and latencies are recorded by the [`track_http_metrics`] middleware.
//! The exposition text is served on `GET /metrics`.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::cache::CacheMetrics;
use crate::error::{Error, Result};

/// Metric names exported on `/metrics`.
pub mod names {
    /// Reads served from the cache.
    pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
    /// Reads that fell through to the entity store.
    pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
    /// Entries removed by expiry sweeps.
    pub const CACHE_EVICTIONS_TOTAL: &str = "cache_evictions_total";

    /// HTTP requests handled, by method, route and status.
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    /// HTTP request latency in seconds, by method, route and status.
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
}

/// Route excluded from request metrics so scrapes do not count themselves.
pub const METRICS_PATH: &str = "/metrics";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::CACHE_HITS_TOTAL,
        "Total number of cache hits"
    );
    describe_counter!(
        names::CACHE_MISSES_TOTAL,
        "Total number of cache misses"
    );
    describe_counter!(
        names::CACHE_EVICTIONS_TOTAL,
        "Total number of cache evictions"
    );
    describe_counter!(
        names::HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests"
    );
    describe_histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Duration of HTTP requests"
    );
}

/// Installs the process-wide Prometheus recorder and describes every metric.
///
/// Fails if a recorder has already been installed.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("failed to install metrics recorder: {}", e)))?;
    register_metrics();
    Ok(handle)
}

// == Cache Sink ==
/// [`CacheMetrics`] sink that increments the Prometheus cache counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl CacheMetrics for PrometheusMetrics {
    fn record_hit(&self) {
        counter!(names::CACHE_HITS_TOTAL).increment(1);
    }

    fn record_miss(&self) {
        counter!(names::CACHE_MISSES_TOTAL).increment(1);
    }

    fn record_evictions(&self, count: u64) {
        counter!(names::CACHE_EVICTIONS_TOTAL).increment(count);
    }
}

// == Request Middleware ==
/// Records one request count and one latency sample per handled request.
///
/// The `path` label is the matched route template (`/user/:id`), so ids do
/// not explode label cardinality. Mount with `Router::route_layer`.
pub async fn track_http_metrics(req: Request, next: Next) -> Response {
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => req.uri().path().to_owned(),
    };
    if path == METRICS_PATH {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        names::HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(elapsed);

    response
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    #[test]
    fn test_cache_counters_rendered() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            let sink = PrometheusMetrics;
            sink.record_hit();
            sink.record_hit();
            sink.record_miss();
            sink.record_evictions(3);
        });

        let rendered = handle.render();
        assert!(rendered.contains("cache_hits_total 2"));
        assert!(rendered.contains("cache_misses_total 1"));
        assert!(rendered.contains("cache_evictions_total 3"));
    }

    #[tokio::test]
    async fn test_requests_labelled_by_route_template() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let app = Router::new()
            .route("/item/:id", get(|| async { StatusCode::NO_CONTENT }))
            .route(METRICS_PATH, get(|| async { "ok" }))
            .route_layer(middleware::from_fn(track_http_metrics));

        for uri in ["/item/1", "/item/2", METRICS_PATH] {
            let response = app
                .clone()
                .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert!(response.status().is_success());
        }

        let rendered = handle.render();
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("http_request_duration_seconds"));
        assert!(rendered.contains(r#"path="/item/:id""#));
        assert!(rendered.contains(r#"status="204""#));
        assert!(!rendered.contains(r#"path="/item/1""#));
        assert!(!rendered.contains(r#"path="/metrics""#));
    }
}
