/// Post service - handles post creation, listing, retrieval and deletion
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::ensure_post_owner;
use crate::models::{CreatePostRequest, CreatedPost, PostResponse, PostSummary};
use crate::pagination::{Page, PageRequest};
use crate::storage::ImageStore;
use std::sync::Arc;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    images: ImageStore,
    max_image_bytes: usize,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, images: ImageStore, max_image_bytes: usize) -> Self {
        Self {
            posts,
            images,
            max_image_bytes,
        }
    }

    pub async fn create(&self, user_id: &str, req: CreatePostRequest) -> Result<CreatedPost> {
        let new_post = req.into_new_post(self.max_image_bytes)?;

        let post_id = self
            .posts
            .create_with_image(user_id, &new_post.message, &new_post.image, &self.images)
            .await?;

        metrics::record_content_event("post", "created");
        tracing::info!(post_id, %user_id, image_bytes = new_post.image.len(), "post created");

        Ok(CreatedPost { post_id })
    }

    /// One page of post ids, newest first; `author` narrows to one user.
    pub async fn list(
        &self,
        author: Option<&str>,
        page: PageRequest,
        path: String,
    ) -> Result<Page<PostSummary>> {
        let total = self.posts.count(author).await?;
        page.ensure_within(total)?;

        let ids = self.posts.list_ids(author, page).await?;
        Ok(Page::new(ids, total, page, path).map(|id| PostSummary { id }))
    }

    pub async fn show(&self, viewer: &str, post_id: i64) -> Result<PostResponse> {
        let detail = self
            .posts
            .find_detail(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        let image = self.images.load_base64(post_id).await?;
        if image.is_none() {
            tracing::warn!(post_id, "image file missing for post");
        }

        Ok(PostResponse {
            post_id: detail.id,
            mine_frg: detail.user_id == viewer,
            user_name: detail.user_name,
            message: detail.message,
            post_date: detail.created_at,
            comment_count: detail.comment_count,
            image,
        })
    }

    pub async fn delete(&self, viewer: &str, post_id: i64) -> Result<()> {
        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        ensure_post_owner(viewer, &post)?;

        self.posts.delete_with_image(post_id, &self.images).await?;

        metrics::record_content_event("post", "deleted");
        tracing::info!(post_id, user_id = %viewer, "post deleted");
        Ok(())
    }
}
