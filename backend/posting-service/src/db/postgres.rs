//! PostgreSQL repositories

use super::{CommentRepository, PostRepository, TokenRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{AccessToken, Comment, CommentDetail, Post, PostDetail, User};
use crate::pagination::PageRequest;
use crate::storage::ImageStore;
use crate::validators::user_id_taken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationErrors;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// =====================================================================
// Users
// =====================================================================

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, user_name, password_hash, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists(&self, user_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, user_id: &str, user_name: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, user_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, user_name, password_hash, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(user_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                let mut errors = ValidationErrors::new();
                errors.add("user_id", user_id_taken());
                Err(AppError::Validation(errors))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(
        &self,
        user_id: &str,
        user_name: &str,
        password_hash: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET user_name = $2,
                password_hash = COALESCE($3, password_hash),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(user_name)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }
}

// =====================================================================
// Posts
// =====================================================================

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create_with_image(
        &self,
        user_id: &str,
        message: &str,
        image: &[u8],
        images: &ImageStore,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let post_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (user_id, message) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(message)
        .fetch_one(&mut *tx)
        .await?;

        if let Err(e) = images.save(post_id, image).await {
            tracing::error!(post_id, error = %e, "image write failed, rolling back post");
            tx.rollback().await?;
            return Err(e.into());
        }

        if let Err(e) = tx.commit().await {
            // The row is gone, so the file must go too.
            if let Err(cleanup) = images.delete(post_id).await {
                tracing::warn!(post_id, error = %cleanup, "orphaned image after failed commit");
            }
            return Err(e.into());
        }

        Ok(post_id)
    }

    async fn find(&self, post_id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, message, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_detail(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let detail = sqlx::query_as::<_, PostDetail>(
            r#"
            SELECT p.id, p.user_id, u.user_name, p.message, p.created_at,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
            FROM posts p
            JOIN users u ON u.user_id = p.user_id
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    async fn count(&self, author: Option<&str>) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE ($1::varchar IS NULL OR user_id = $1)",
        )
        .bind(author)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn list_ids(&self, author: Option<&str>, page: PageRequest) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM posts
            WHERE ($1::varchar IS NULL OR user_id = $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn delete_with_image(&self, post_id: i64, images: &ImageStore) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        if let Err(e) = images.delete(post_id).await {
            tracing::error!(post_id, error = %e, "image delete failed, rolling back post delete");
            tx.rollback().await?;
            return Err(e.into());
        }

        tx.commit().await?;
        Ok(())
    }
}

// =====================================================================
// Comments
// =====================================================================

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, post_id: i64, user_id: &str, comment: &str) -> Result<i64> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO comments (post_id, user_id, comment)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(comment)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(id),
            // The post was deleted between the existence check and the insert.
            Err(e) if is_foreign_key_violation(&e) => {
                Err(AppError::NotFound(format!("post {}", post_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, comment_id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, comment, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn list_for_post(&self, post_id: i64, page: PageRequest) -> Result<Vec<CommentDetail>> {
        let comments = sqlx::query_as::<_, CommentDetail>(
            r#"
            SELECT c.id, c.post_id, c.user_id, u.user_name, c.comment
            FROM comments c
            JOIN users u ON u.user_id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn delete(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =====================================================================
// Access tokens
// =====================================================================

#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert(&self, token: &AccessToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens (jti, user_id, token_hash, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(token.jti)
        .bind(&token.user_id)
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, jti: Uuid) -> Result<Option<AccessToken>> {
        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT jti, user_id, token_hash, created_at, expires_at
            FROM access_tokens
            WHERE jti = $1
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn delete(&self, jti: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE jti = $1")
            .bind(jti)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
