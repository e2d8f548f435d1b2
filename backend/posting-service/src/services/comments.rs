/// Comment service - comments attached to posts
use crate::db::{CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::ensure_comment_owner;
use crate::models::{CommentResponse, CreateCommentRequest, CreatedComment};
use crate::pagination::{Page, PageRequest};
use std::sync::Arc;
use validator::Validate;

pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { posts, comments }
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<()> {
        match self.posts.find(post_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("post {}", post_id))),
        }
    }

    pub async fn create(
        &self,
        user_id: &str,
        post_id: i64,
        req: &CreateCommentRequest,
    ) -> Result<CreatedComment> {
        self.ensure_post_exists(post_id).await?;
        req.validate()?;

        let comment_id = self
            .comments
            .create(post_id, user_id, req.comment())
            .await?;

        metrics::record_content_event("comment", "created");
        tracing::info!(comment_id, post_id, %user_id, "comment created");

        Ok(CreatedComment { comment_id })
    }

    pub async fn list(
        &self,
        viewer: &str,
        post_id: i64,
        page: PageRequest,
        path: String,
    ) -> Result<Page<CommentResponse>> {
        self.ensure_post_exists(post_id).await?;

        let total = self.comments.count_for_post(post_id).await?;
        page.ensure_within(total)?;

        let comments = self.comments.list_for_post(post_id, page).await?;
        Ok(Page::new(comments, total, page, path)
            .map(|detail| CommentResponse::from_detail(detail, viewer)))
    }

    pub async fn delete(&self, viewer: &str, comment_id: i64) -> Result<()> {
        let comment = self
            .comments
            .find(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        ensure_comment_owner(viewer, &comment)?;

        if !self.comments.delete(comment_id).await? {
            // Removed concurrently, e.g. by its post being deleted.
            return Err(AppError::NotFound(format!("comment {}", comment_id)));
        }

        metrics::record_content_event("comment", "deleted");
        tracing::info!(comment_id, user_id = %viewer, "comment deleted");
        Ok(())
    }
}
