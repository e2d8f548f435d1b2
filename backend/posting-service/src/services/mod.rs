/// Business logic layer
///
/// Services own the rules (validation that needs storage, ownership, paging
/// bounds) and talk to storage only through the repository traits.
pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;

pub use auth::AuthService;
pub use comments::CommentService;
pub use posts::PostService;
pub use users::UserService;

use crate::AppState;

impl AppState {
    pub fn user_service(&self) -> UserService {
        UserService::new(self.users.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.users.clone(),
            self.tokens.clone(),
            self.config.auth.token_ttl(),
        )
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(
            self.posts.clone(),
            self.images.clone(),
            self.config.storage.image_max_bytes,
        )
    }

    pub fn comment_service(&self) -> CommentService {
        CommentService::new(self.posts.clone(), self.comments.clone())
    }
}
