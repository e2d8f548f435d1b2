/// Auth service - issues and revokes bearer tokens
///
/// A token is only honoured while its `jti` row exists, which is what makes
/// logout immediate even though the JWT itself is still within its lifetime.
use crate::db::{TokenRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{AccessToken, LoginRequest, TokenResponse};
use crate::security::verify_password_blocking;
use crypto_core::{jwt, sha256_hex};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const BAD_CREDENTIALS: &str = "Invalid user_id or password";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    token_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            token_ttl,
        }
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<TokenResponse> {
        req.validate()?;

        let Some(user) = self.users.find_by_user_id(req.user_id()).await? else {
            metrics::record_auth_event("login_failed");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        };

        let valid =
            verify_password_blocking(req.password().to_string(), user.password_hash.clone())
                .await?;
        if !valid {
            metrics::record_auth_event("login_failed");
            tracing::info!(user_id = %user.user_id, "login rejected");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }

        let issued = jwt::generate_access_token(&user.user_id, self.token_ttl)?;
        self.tokens
            .insert(&AccessToken {
                jti: issued.jti,
                user_id: user.user_id.clone(),
                token_hash: sha256_hex(&issued.token),
                created_at: issued.issued_at,
                expires_at: issued.expires_at,
            })
            .await?;

        metrics::record_auth_event("login");
        tracing::info!(user_id = %user.user_id, jti = %issued.jti, "access token issued");

        Ok(TokenResponse {
            token: issued.token,
        })
    }

    /// Revoke the token identified by `jti`.
    pub async fn logout(&self, user_id: &str, jti: Uuid) -> Result<()> {
        if !self.tokens.delete(jti).await? {
            // Raced with another logout or the sweeper.
            tracing::debug!(%user_id, %jti, "token row already gone");
        }

        metrics::record_auth_event("logout");
        tracing::info!(%user_id, %jti, "access token revoked");
        Ok(())
    }
}
