/// HTTP handlers for the posting API
///
/// Handlers only unpack the request and pick the status code; the rules live
/// in `services`.
pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

pub use auth::{login, logout};
pub use comments::{create_comment, delete_comment, list_comments};
pub use health::{liveness, readiness};
pub use posts::{create_post, delete_post, get_post, list_my_posts, list_posts};
pub use users::{get_profile, register, update_profile};
