/// Database access layer
///
/// Each aggregate has a repository trait with two implementations:
/// - `postgres`: sqlx over a `PgPool`, schema in `migrations/`
/// - `memory`: a lock-guarded map used by tests and `STORAGE_BACKEND=memory`
///
/// Post creation and deletion take the `ImageStore` so the row change and the
/// file change commit or roll back together.
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgCommentRepository, PgPostRepository, PgTokenRepository, PgUserRepository};

use crate::error::Result;
use crate::models::{AccessToken, Comment, CommentDetail, Post, PostDetail, User};
use crate::pagination::PageRequest;
use crate::storage::ImageStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>>;

    async fn exists(&self, user_id: &str) -> Result<bool>;

    /// Insert a user. A taken `user_id` is reported as a validation error.
    async fn create(&self, user_id: &str, user_name: &str, password_hash: &str) -> Result<User>;

    /// Update the display name and, when given, the password hash.
    async fn update_profile(
        &self,
        user_id: &str,
        user_name: &str,
        password_hash: Option<&str>,
    ) -> Result<()>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert the row and write its image; both or neither persist.
    async fn create_with_image(
        &self,
        user_id: &str,
        message: &str,
        image: &[u8],
        images: &ImageStore,
    ) -> Result<i64>;

    async fn find(&self, post_id: i64) -> Result<Option<Post>>;

    async fn find_detail(&self, post_id: i64) -> Result<Option<PostDetail>>;

    /// Number of posts, optionally restricted to one author.
    async fn count(&self, author: Option<&str>) -> Result<i64>;

    /// Post ids for one page, newest first.
    async fn list_ids(&self, author: Option<&str>, page: PageRequest) -> Result<Vec<i64>>;

    /// Delete the row (comments cascade) and its image; both or neither.
    async fn delete_with_image(&self, post_id: i64, images: &ImageStore) -> Result<()>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment. A missing post is reported as not found.
    async fn create(&self, post_id: i64, user_id: &str, comment: &str) -> Result<i64>;

    async fn find(&self, comment_id: i64) -> Result<Option<Comment>>;

    async fn count_for_post(&self, post_id: i64) -> Result<i64>;

    /// Comments of one post for one page, newest first.
    async fn list_for_post(&self, post_id: i64, page: PageRequest) -> Result<Vec<CommentDetail>>;

    async fn delete(&self, comment_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, token: &AccessToken) -> Result<()>;

    async fn find(&self, jti: Uuid) -> Result<Option<AccessToken>>;

    async fn delete(&self, jti: Uuid) -> Result<bool>;

    /// Remove tokens whose expiry is at or before `now`; returns how many.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
