//! Metrics Module
//!
//! Process-wide counters for cache hits/misses and per-endpoint request,
//! latency and error statistics. Derived rates are computed fresh on every
//! snapshot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

// == Internal State ==
#[derive(Debug, Default)]
struct EndpointSamples {
    requests: u64,
    errors: u64,
    latencies_ms: Vec<f64>,
}

#[derive(Debug)]
struct MetricsState {
    cache_hits: u64,
    cache_misses: u64,
    total_requests: u64,
    total_errors: u64,
    endpoints: HashMap<String, EndpointSamples>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            cache_hits: 0,
            cache_misses: 0,
            total_requests: 0,
            total_errors: 0,
            endpoints: HashMap::new(),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

// == Snapshot ==
/// Point-in-time view of all metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub started_at: String,
    pub cache: CacheMetrics,
    pub requests: RequestTotals,
    /// Keyed by `"<METHOD> <route>"`
    pub endpoints: BTreeMap<String, EndpointMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    /// Percentage, two decimals
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestTotals {
    pub total: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointMetrics {
    pub requests: u64,
    pub errors: u64,
    pub avg_response_time_ms: f64,
    /// Percentage, two decimals
    pub error_rate: f64,
}

// == Metrics Collector ==
/// Cloneable handle to the shared metrics state.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    state: Arc<RwLock<MetricsState>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MetricsState::new())),
        }
    }

    pub async fn record_cache_hit(&self) {
        self.state.write().await.cache_hits += 1;
    }

    pub async fn record_cache_miss(&self) {
        self.state.write().await.cache_misses += 1;
    }

    /// Records one completed request against its route.
    pub async fn record_request(&self, method: &str, path: &str, elapsed_ms: f64, status: u16) {
        let mut state = self.state.write().await;
        let is_error = status >= 400;

        state.total_requests += 1;
        if is_error {
            state.total_errors += 1;
        }

        let samples = state
            .endpoints
            .entry(format!("{method} {path}"))
            .or_default();
        samples.requests += 1;
        samples.latencies_ms.push(elapsed_ms);
        if is_error {
            samples.errors += 1;
        }
    }

    /// Computes the current snapshot.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read().await;

        let endpoints = state
            .endpoints
            .iter()
            .map(|(name, samples)| {
                let avg = if samples.latencies_ms.is_empty() {
                    0.0
                } else {
                    samples.latencies_ms.iter().sum::<f64>() / samples.latencies_ms.len() as f64
                };
                (
                    name.clone(),
                    EndpointMetrics {
                        requests: samples.requests,
                        errors: samples.errors,
                        avg_response_time_ms: round2(avg),
                        error_rate: percentage(samples.errors, samples.requests),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            uptime_seconds: state.started.elapsed().as_secs(),
            started_at: state.started_at.to_rfc3339(),
            cache: CacheMetrics {
                hits: state.cache_hits,
                misses: state.cache_misses,
                hit_rate: percentage(state.cache_hits, state.cache_hits + state.cache_misses),
            },
            requests: RequestTotals {
                total: state.total_requests,
                errors: state.total_errors,
            },
            endpoints,
        }
    }

    /// Zeroes every counter and restarts the uptime clock.
    pub async fn reset(&self) {
        *self.state.write().await = MetricsState::new();
    }
}

/// `part / whole * 100` rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// == Middleware ==
/// Times every routed request and records it under its route template.
pub async fn track_requests(
    State(metrics): State<MetricsCollector>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    metrics
        .record_request(&method, &path, elapsed_ms, response.status().as_u16())
        .await;

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_snapshot() {
        let metrics = MetricsCollector::new();
        let snap = metrics.snapshot().await;

        assert_eq!(snap.cache.hits, 0);
        assert_eq!(snap.cache.misses, 0);
        assert_eq!(snap.cache.hit_rate, 0.0);
        assert_eq!(snap.requests.total, 0);
        assert!(snap.endpoints.is_empty());
    }

    #[tokio::test]
    async fn test_hit_rate() {
        let metrics = MetricsCollector::new();
        metrics.record_cache_hit().await;
        metrics.record_cache_hit().await;
        metrics.record_cache_miss().await;

        let snap = metrics.snapshot().await;
        assert_eq!(snap.cache.hits, 2);
        assert_eq!(snap.cache.misses, 1);
        assert_eq!(snap.cache.hit_rate, 66.67);
    }

    #[tokio::test]
    async fn test_record_request_aggregates_per_endpoint() {
        let metrics = MetricsCollector::new();
        metrics.record_request("GET", "/pessoas/:id", 10.0, 200).await;
        metrics.record_request("GET", "/pessoas/:id", 20.0, 404).await;
        metrics.record_request("POST", "/pessoas", 5.0, 201).await;

        let snap = metrics.snapshot().await;
        assert_eq!(snap.requests.total, 3);
        assert_eq!(snap.requests.errors, 1);

        let by_id = &snap.endpoints["GET /pessoas/:id"];
        assert_eq!(by_id.requests, 2);
        assert_eq!(by_id.errors, 1);
        assert_eq!(by_id.avg_response_time_ms, 15.0);
        assert_eq!(by_id.error_rate, 50.0);

        let create = &snap.endpoints["POST /pessoas"];
        assert_eq!(create.errors, 0);
        assert_eq!(create.error_rate, 0.0);
    }

    #[tokio::test]
    async fn test_status_boundary() {
        let metrics = MetricsCollector::new();
        metrics.record_request("GET", "/x", 1.0, 399).await;
        metrics.record_request("GET", "/x", 1.0, 400).await;

        assert_eq!(metrics.snapshot().await.requests.errors, 1);
    }

    #[tokio::test]
    async fn test_reset() {
        let metrics = MetricsCollector::new();
        metrics.record_cache_hit().await;
        metrics.record_request("GET", "/x", 1.0, 500).await;

        metrics.reset().await;

        let snap = metrics.snapshot().await;
        assert_eq!(snap.cache.hits, 0);
        assert_eq!(snap.requests.total, 0);
        assert!(snap.endpoints.is_empty());
        assert_eq!(snap.uptime_seconds, 0);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let metrics = MetricsCollector::new();
        let other = metrics.clone();
        other.record_cache_miss().await;

        assert_eq!(metrics.snapshot().await.cache.misses, 1);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(2, 4), 50.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(5, 5), 100.0);
    }
}
