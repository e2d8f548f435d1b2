/// User service - registration and profile management
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{ProfileResponse, RegisterRequest, UpdateProfileRequest};
use crate::security::{hash_password_blocking, verify_password_blocking};
use crate::validators::{current_password_mismatch, into_result, user_id_taken};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create an account. All field errors, including a taken `user_id`,
    /// are reported in one response.
    pub async fn register(&self, req: &RegisterRequest) -> Result<()> {
        let mut errors = req.validate().err().unwrap_or_else(ValidationErrors::new);

        let id_is_wellformed = !errors.field_errors().contains_key("user_id");
        if id_is_wellformed && self.users.exists(req.user_id()).await? {
            errors.add("user_id", user_id_taken());
        }
        into_result(errors)?;

        let password_hash = hash_password_blocking(req.password().to_string()).await?;
        let user = self
            .users
            .create(req.user_id(), req.user_name(), &password_hash)
            .await?;

        metrics::record_auth_event("register");
        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(())
    }

    pub async fn profile(&self, user_id: &str) -> Result<ProfileResponse> {
        let user = self
            .users
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        Ok(user.into())
    }

    /// Rename, and change the password when both password fields are given.
    pub async fn update_profile(&self, user_id: &str, req: &UpdateProfileRequest) -> Result<()> {
        let mut errors = req.validate().err().unwrap_or_else(ValidationErrors::new);

        let user = self
            .users
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        if let Some(current) = req.current_password() {
            let matches =
                verify_password_blocking(current.to_string(), user.password_hash.clone()).await?;
            if !matches {
                errors.add("current_password", current_password_mismatch());
            }
        }
        into_result(errors)?;

        let new_hash = match req.new_password() {
            Some(pw) => Some(hash_password_blocking(pw.to_string()).await?),
            None => None,
        };

        self.users
            .update_profile(user_id, req.user_name(), new_hash.as_deref())
            .await?;

        tracing::info!(%user_id, password_changed = new_hash.is_some(), "profile updated");
        Ok(())
    }
}
