use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all artist registry metrics
const PREFIX: &str = "artist_registry";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Upstream Metrics
    pub static ref UPSTREAM_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_upstream_calls_total"), "Calls to search and summary providers"),
        &["provider", "outcome"]
    ).expect("Failed to create upstream_calls_total metric");

    pub static ref UPSTREAM_CALL_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_upstream_call_duration_seconds"),
            "Upstream call duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["provider"]
    ).expect("Failed to create upstream_call_duration_seconds metric");

    // Pipeline Metrics
    pub static ref RESOLVE_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_resolve_outcomes_total"), "Artist search outcomes"),
        &["outcome"]
    ).expect("Failed to create resolve_outcomes_total metric");

    pub static ref APPLY_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_apply_outcomes_total"), "Apply request outcomes"),
        &["outcome"]
    ).expect("Failed to create apply_outcomes_total metric");

    pub static ref STORED_ARTISTS: Gauge = Gauge::new(
        format!("{PREFIX}_stored_artists"),
        "Number of artists in the store"
    ).expect("Failed to create stored_artists metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_CALL_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(RESOLVE_OUTCOMES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(APPLY_OUTCOMES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(STORED_ARTISTS.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Collapses a request path into a bounded label.
pub fn categorize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "home",
        "/v1/artists/search" => "search",
        "/v1/artists/apply" => "apply",
        "/v1/artists" => "list",
        p if p.starts_with("/v1/artists/") => "artist",
        _ => "other",
    }
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let endpoint = categorize_endpoint(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration.as_secs_f64());
}

/// Record one call to a search or summary provider
pub fn record_upstream_call(provider: &str, outcome: &str, duration: Duration) {
    UPSTREAM_CALLS_TOTAL
        .with_label_values(&[provider, outcome])
        .inc();

    UPSTREAM_CALL_DURATION_SECONDS
        .with_label_values(&[provider])
        .observe(duration.as_secs_f64());
}

pub fn record_resolve_outcome(outcome: &str) {
    RESOLVE_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_apply_outcome(outcome: &str) {
    APPLY_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn set_stored_artists(count: usize) {
    STORED_ARTISTS.set(count as f64);
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                PROCESS_MEMORY_BYTES.set(kb * 1024.0);
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
