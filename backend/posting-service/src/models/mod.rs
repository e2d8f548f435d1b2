/// Data models for the posting service
///
/// Row types map 1:1 to the tables under `migrations/`; response types are
/// the JSON shapes handed back to clients.
pub mod requests;

pub use requests::{
    CreateCommentRequest, CreatePostRequest, LoginRequest, RegisterRequest,
    UpdateProfileRequest,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    /// Public, immutable account name used to log in
    pub user_id: String,
    /// Display name
    pub user_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post joined with its author's display name and comment count.
#[derive(Debug, Clone, FromRow)]
pub struct PostDetail {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment joined with its author's display name.
#[derive(Debug, Clone, FromRow)]
pub struct CommentDetail {
    pub id: i64,
    pub post_id: i64,
    pub user_id: String,
    pub user_name: String,
    pub comment: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct AccessToken {
    pub jti: Uuid,
    pub user_id: String,
    /// Hex SHA-256 of the bearer string
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// ---------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub user_name: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedPost {
    pub post_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatedComment {
    pub comment_id: i64,
}

/// Item of the post listings
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post_id: i64,
    pub mine_frg: bool,
    pub user_name: String,
    pub message: String,
    pub post_date: DateTime<Utc>,
    pub comment_count: i64,
    /// Base64 of the stored image, `null` when the file is gone
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment_id: i64,
    pub post_id: i64,
    pub mine_frg: bool,
    pub user_name: String,
    pub comment: String,
}

impl CommentResponse {
    pub fn from_detail(detail: CommentDetail, viewer: &str) -> Self {
        Self {
            comment_id: detail.id,
            post_id: detail.post_id,
            mine_frg: detail.user_id == viewer,
            user_name: detail.user_name,
            comment: detail.comment,
        }
    }
}
