/// Comment handlers - HTTP endpoints for comment operations
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::CreateCommentRequest;
use crate::pagination::{base_url, PageQuery, PageRequest};
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};

/// Create a comment on a post
pub async fn create_comment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let created = state
        .comment_service()
        .create(&user.user_id, post_id.into_inner(), &req)
        .await?;

    Ok(HttpResponse::Created().json(created))
}

/// Comments of a post, newest first
pub async fn list_comments(
    http: HttpRequest,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    post_id: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = PageRequest::from_query(&query, state.config.pagination.per_page);
    let comments = state
        .comment_service()
        .list(&user.user_id, post_id.into_inner(), page, base_url(&http))
        .await?;

    Ok(HttpResponse::Ok().json(comments))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    comment_id: web::Path<i64>,
) -> Result<HttpResponse> {
    state
        .comment_service()
        .delete(&user.user_id, comment_id.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
