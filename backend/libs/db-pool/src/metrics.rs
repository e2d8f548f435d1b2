//! Prometheus collectors for the connection pool
//!
//! Everything is labelled by service so several pools can share a registry.

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    static ref POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Pool connections by state (idle, in_use, max)",
        &["service", "state"]
    ).expect("db_pool_connections registration");

    static ref ACQUIRE_SECONDS: HistogramVec = register_histogram_vec!(
        "db_pool_acquire_duration_seconds",
        "Time spent waiting for a pooled connection",
        &["service"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).expect("db_pool_acquire_duration_seconds registration");

    static ref ACQUIRE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "db_pool_acquire_failures_total",
        "Failed connection checkouts by cause",
        &["service", "cause"]
    ).expect("db_pool_acquire_failures_total registration");

    static ref PINGS: IntCounterVec = register_int_counter_vec!(
        "db_pool_pings_total",
        "Readiness round trips by outcome",
        &["service", "outcome"]
    ).expect("db_pool_pings_total registration");
}

/// Snapshot the pool's gauges.
pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let size = i64::from(pool.size());
    let idle = pool.num_idle() as i64;
    let max = i64::from(pool.options().get_max_connections());

    for (state, value) in [("idle", idle), ("in_use", size - idle), ("max", max)] {
        POOL_CONNECTIONS.with_label_values(&[service, state]).set(value);
    }
}

pub(crate) fn record_ping(service: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "failed" };
    PINGS.with_label_values(&[service, outcome]).inc();
}

fn failure_cause(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::PoolTimedOut => "timeout",
        sqlx::Error::PoolClosed => "closed",
        sqlx::Error::Io(_) => "io",
        _ => "other",
    }
}

/// Check a connection out of `pool`, timing the wait.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let start = Instant::now();
    let result = pool.acquire().await;

    ACQUIRE_SECONDS
        .with_label_values(&[service])
        .observe(start.elapsed().as_secs_f64());

    if let Err(e) = &result {
        ACQUIRE_FAILURES
            .with_label_values(&[service, failure_cause(e)])
            .inc();
    }

    result
}
