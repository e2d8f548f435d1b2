/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::CreatePostRequest;
use crate::pagination::{base_url, PageQuery, PageRequest};
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};

/// Create a post with its image
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let created = state
        .post_service()
        .create(&user.user_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(created))
}

/// All posts, newest first
pub async fn list_posts(
    http: HttpRequest,
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::from_query(&query, state.config.pagination.per_page);
    let posts = state
        .post_service()
        .list(None, page, base_url(&http))
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// The caller's own posts, newest first
pub async fn list_my_posts(
    http: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::from_query(&query, state.config.pagination.per_page);
    let posts = state
        .post_service()
        .list(Some(&user.user_id), page, base_url(&http))
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = state
        .post_service()
        .show(&user.user_id, post_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    state
        .post_service()
        .delete(&user.user_id, post_id.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
