/// Token handlers - login and logout
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::LoginRequest;
use crate::AppState;
use actix_web::{web, HttpResponse};

/// POST /api/auth/token
pub async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let token = state.auth_service().login(&req).await?;
    Ok(HttpResponse::Ok().json(token))
}

/// DELETE /api/auth/token
pub async fn logout(state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
    state.auth_service().logout(&user.user_id, user.jti).await?;
    Ok(HttpResponse::NoContent().finish())
}
