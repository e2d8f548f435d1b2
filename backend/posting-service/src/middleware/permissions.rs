/// Ownership checks for posts and comments
///
/// Only the author may delete a post or a comment.
use crate::error::{AppError, Result};
use crate::models::{Comment, Post};

pub fn ensure_post_owner(user_id: &str, post: &Post) -> Result<()> {
    if post.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to delete this post".into(),
        ))
    }
}

pub fn ensure_comment_owner(user_id: &str, comment: &Comment) -> Result<()> {
    if comment.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to delete this comment".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(owner: &str) -> Post {
        Post {
            id: 1,
            user_id: owner.to_string(),
            message: "hi".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_may_delete_post() {
        assert!(ensure_post_owner("alice", &post("alice")).is_ok());
        assert!(matches!(
            ensure_post_owner("bob", &post("alice")),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owner_may_delete_comment() {
        let comment = Comment {
            id: 7,
            post_id: 1,
            user_id: "alice".into(),
            comment: "nice".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(ensure_comment_owner("alice", &comment).is_ok());
        assert!(ensure_comment_owner("bob", &comment).is_err());
    }
}
