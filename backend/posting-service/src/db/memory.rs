//! In-memory repositories
//!
//! One `MemoryStore` implements every repository trait over shared tables so
//! joins (author names, comment counts) and cascades behave like PostgreSQL.
//! Writes that touch the image store hold the table lock across the file
//! operation, which gives the same all-or-nothing outcome as a transaction.

use super::{CommentRepository, PostRepository, TokenRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{AccessToken, Comment, CommentDetail, Post, PostDetail, User};
use crate::pagination::PageRequest;
use crate::storage::ImageStore;
use crate::validators::user_id_taken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    tokens: HashMap<Uuid, AccessToken>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn user_name(&self, user_id: &str) -> String {
        self.users
            .get(user_id)
            .map(|u| u.user_name.clone())
            .unwrap_or_default()
    }

    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_slice<T>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    items
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.tables.read().await.users.contains_key(user_id))
    }

    async fn create(&self, user_id: &str, user_name: &str, password_hash: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(user_id) {
            let mut errors = ValidationErrors::new();
            errors.add("user_id", user_id_taken());
            return Err(AppError::Validation(errors));
        }

        let now = Utc::now();
        let user = User {
            id: Tables::next_id(&mut tables.next_user_id),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.user_id.clone(), user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        user_name: &str,
        password_hash: Option<&str>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        user.user_name = user_name.to_string();
        if let Some(hash) = password_hash {
            user.password_hash = hash.to_string();
        }
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_with_image(
        &self,
        user_id: &str,
        message: &str,
        image: &[u8],
        images: &ImageStore,
    ) -> Result<i64> {
        let mut tables = self.tables.write().await;
        let post_id = Tables::next_id(&mut tables.next_post_id);

        if let Err(e) = images.save(post_id, image).await {
            tracing::error!(post_id, error = %e, "image write failed, rolling back post");
            return Err(e.into());
        }

        let now = Utc::now();
        tables.posts.insert(
            post_id,
            Post {
                id: post_id,
                user_id: user_id.to_string(),
                message: message.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(post_id)
    }

    async fn find(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn find_detail(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let tables = self.tables.read().await;
        let Some(post) = tables.posts.get(&post_id) else {
            return Ok(None);
        };

        let comment_count = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .count() as i64;

        Ok(Some(PostDetail {
            id: post.id,
            user_id: post.user_id.clone(),
            user_name: tables.user_name(&post.user_id),
            message: post.message.clone(),
            created_at: post.created_at,
            comment_count,
        }))
    }

    async fn count(&self, author: Option<&str>) -> Result<i64> {
        let tables = self.tables.read().await;
        let total = tables
            .posts
            .values()
            .filter(|p| author.map_or(true, |a| p.user_id == a))
            .count();
        Ok(total as i64)
    }

    async fn list_ids(&self, author: Option<&str>, page: PageRequest) -> Result<Vec<i64>> {
        let tables = self.tables.read().await;
        let ids = tables
            .posts
            .values()
            .rev()
            .filter(|p| author.map_or(true, |a| p.user_id == a))
            .map(|p| p.id);
        Ok(page_slice(ids, page))
    }

    async fn delete_with_image(&self, post_id: i64, images: &ImageStore) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        if let Err(e) = images.delete(post_id).await {
            tracing::error!(post_id, error = %e, "image delete failed, rolling back post delete");
            return Err(e.into());
        }

        tables.posts.remove(&post_id);
        tables.comments.retain(|_, c| c.post_id != post_id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, post_id: i64, user_id: &str, comment: &str) -> Result<i64> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        let comment_id = Tables::next_id(&mut tables.next_comment_id);
        let now = Utc::now();
        tables.comments.insert(
            comment_id,
            Comment {
                id: comment_id,
                post_id,
                user_id: user_id.to_string(),
                comment: comment.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(comment_id)
    }

    async fn find(&self, comment_id: i64) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&comment_id).cloned())
    }

    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .count() as i64)
    }

    async fn list_for_post(&self, post_id: i64, page: PageRequest) -> Result<Vec<CommentDetail>> {
        let tables = self.tables.read().await;
        let details = tables
            .comments
            .values()
            .rev()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentDetail {
                id: c.id,
                post_id: c.post_id,
                user_id: c.user_id.clone(),
                user_name: tables.user_name(&c.user_id),
                comment: c.comment.clone(),
            });
        Ok(page_slice(details, page))
    }

    async fn delete(&self, comment_id: i64) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .comments
            .remove(&comment_id)
            .is_some())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert(&self, token: &AccessToken) -> Result<()> {
        self.tables
            .write()
            .await
            .tokens
            .insert(token.jti, token.clone());
        Ok(())
    }

    async fn find(&self, jti: Uuid) -> Result<Option<AccessToken>> {
        Ok(self.tables.read().await.tokens.get(&jti).cloned())
    }

    async fn delete(&self, jti: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.tokens.remove(&jti).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - tables.tokens.len()) as u64)
    }
}
