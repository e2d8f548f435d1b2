/// Liveness and readiness probes
use crate::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    checks: BTreeMap<&'static str, ComponentCheck>,
    timestamp: String,
}

/// GET /api/health/live
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "alive": true,
        "service": "posting-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/health/ready
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let database = match &state.pool {
        Some(pool) => {
            let start = Instant::now();
            let result = db_pool::ping(pool, "posting-service", PING_TIMEOUT).await;
            let latency_ms = Some(start.elapsed().as_millis() as u64);
            match result {
                Ok(()) => ComponentCheck {
                    status: ComponentStatus::Healthy,
                    message: "PostgreSQL connection successful".to_string(),
                    latency_ms,
                },
                Err(e) => ComponentCheck {
                    status: ComponentStatus::Unhealthy,
                    message: format!("PostgreSQL connection failed: {}", e),
                    latency_ms,
                },
            }
        }
        None => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "in-memory storage".to_string(),
            latency_ms: None,
        },
    };

    let images = match tokio::fs::metadata(state.images.base_dir()).await {
        Ok(meta) if meta.is_dir() => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "image directory present".to_string(),
            latency_ms: None,
        },
        // Created on first upload.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "image directory not created yet".to_string(),
            latency_ms: None,
        },
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: "image path is not a directory".to_string(),
            latency_ms: None,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("image directory unreadable: {}", e),
            latency_ms: None,
        },
    };

    let ready = [&database, &images]
        .iter()
        .all(|c| matches!(c.status, ComponentStatus::Healthy));

    let response = ReadinessResponse {
        ready,
        checks: BTreeMap::from([("postgresql", database), ("images", images)]),
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
