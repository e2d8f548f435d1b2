//! Prometheus metrics for posting-service.
//!
//! Exposes HTTP and domain collectors and the handler behind `/metrics`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Requests served, by method, matched route pattern and status code.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posting_http_requests_total",
        "HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register posting_http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "posting_http_request_duration_seconds",
        "HTTP request latency segmented by method and route",
        &["method", "route"]
    )
    .expect("failed to register posting_http_request_duration_seconds");

    /// Post and comment lifecycle events (created/deleted).
    pub static ref CONTENT_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posting_content_events_total",
        "Post and comment lifecycle events",
        &["kind", "action"]
    )
    .expect("failed to register posting_content_events_total");

    /// Registration, login and logout outcomes.
    pub static ref AUTH_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posting_auth_events_total",
        "Authentication events segmented by outcome",
        &["event"]
    )
    .expect("failed to register posting_auth_events_total");

    /// Token sweeper runs by result (success/error).
    pub static ref TOKEN_SWEEP_RUNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posting_token_sweep_runs_total",
        "Expired token sweeper runs segmented by result",
        &["result"]
    )
    .expect("failed to register posting_token_sweep_runs_total");

    pub static ref TOKENS_SWEPT_TOTAL: IntCounter = register_int_counter!(
        "posting_tokens_swept_total",
        "Expired access tokens removed by the sweeper"
    )
    .expect("failed to register posting_tokens_swept_total");
}

pub fn record_http_request(method: &str, route: &str, status: u16, elapsed_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed_secs);
}

pub fn record_content_event(kind: &str, action: &str) {
    CONTENT_EVENTS_TOTAL.with_label_values(&[kind, action]).inc();
}

pub fn record_auth_event(event: &str) {
    AUTH_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

pub fn record_token_sweep(result: &str, removed: u64) {
    TOKEN_SWEEP_RUNS_TOTAL.with_label_values(&[result]).inc();
    TOKENS_SWEPT_TOTAL.inc_by(removed);
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
