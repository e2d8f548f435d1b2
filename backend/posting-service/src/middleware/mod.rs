/// HTTP middleware for the posting service
///
/// `BearerAuth` validates the bearer token of every non-public `/api` route
/// against both its signature and the recorded `access_tokens` row, so a
/// logged-out token stops working immediately. `MetricsMiddleware` records
/// request counts and latency per matched route.
pub mod permissions;

pub use permissions::{ensure_comment_owner, ensure_post_owner};

use crate::error::AppError;
use crate::AppState;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, Method};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use crypto_core::{jwt, sha256_hex};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

// =====================================================================
// Bearer authentication
// =====================================================================

/// Caller identity stored in request extensions after auth.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    /// Id of the access-token row backing this request
    pub jti: Uuid,
}

/// Routes reachable without a token.
fn is_public(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    (method == Method::POST && (path == "/api/users" || path == "/api/auth/token"))
        || path.starts_with("/api/health/")
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AppError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))
}

/// Check signature, expiry and the stored token row.
async fn authenticate(state: &AppState, token: &str) -> Result<AuthenticatedUser, AppError> {
    let data = jwt::validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    let jti = data
        .claims
        .token_id()
        .map_err(|_| AppError::Unauthorized("Invalid token id".into()))?;

    let row = state
        .tokens
        .find(jti)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Token has been revoked".into()))?;

    if row.is_expired_at(Utc::now())
        || row.user_id != data.claims.sub
        || row.token_hash != sha256_hex(token)
    {
        return Err(AppError::Unauthorized("Invalid or expired token".into()));
    }

    Ok(AuthenticatedUser {
        user_id: row.user_id,
        jti,
    })
}

/// Actix middleware that requires a live bearer token.
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            if is_public(req.method(), req.path()) {
                return service.call(req).await;
            }

            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("application state missing".into()))?;

            let token = bearer_token(&req)?;
            let user = authenticate(&state, &token).await?;

            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Authentication required".into()).into()),
        )
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Matched pattern keeps label cardinality bounded.
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let status = match &res {
                Ok(resp) => resp.status().as_u16(),
                Err(err) => err.as_response_error().status_code().as_u16(),
            };

            crate::metrics::record_http_request(&method, &route, status, elapsed.as_secs_f64());
            tracing::debug!(%method, %route, status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}
