/// User handlers - registration and the caller's own profile
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::{RegisterRequest, UpdateProfileRequest};
use crate::AppState;
use actix_web::{web, HttpResponse};

/// POST /api/users
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    state.user_service().register(&req).await?;
    Ok(HttpResponse::Created().finish())
}

/// GET /api/myprofile
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let profile = state.user_service().profile(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PATCH /api/myprofile
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    state
        .user_service()
        .update_profile(&user.user_id, &req)
        .await?;
    Ok(HttpResponse::Ok().finish())
}
