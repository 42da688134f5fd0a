use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use super::jwt::JwtKeys;
use crate::{account::repo_types::User, error::AppError, state::AppState};

/// Caller identified by a live bearer token.
#[derive(Debug)]
pub struct AuthUser(pub User);

/// Caller whose bearer token belongs to an admin.
#[derive(Debug)]
pub struct AdminUser(pub User);

impl AuthUser {
    /// Writes on behalf of `email` are allowed only to its owner.
    pub fn ensure_owner(&self, email: &str) -> Result<(), AppError> {
        if self.0.email == email {
            return Ok(());
        }
        warn!(user_id = %self.0.id, target = %email, "acting on another user's account");
        Err(AppError::forbidden("not allowed to act for this account"))
    }

    /// Reads are additionally open to admins.
    pub fn ensure_owner_or_admin(&self, email: &str) -> Result<(), AppError> {
        if self.0.is_admin() {
            return Ok(());
        }
        self.ensure_owner(email)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::auth("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::auth("invalid auth scheme"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::auth("invalid or expired token")
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::auth("user not found"))?;

        if user.token_version != claims.ver {
            debug!(user_id = %user.id, "token from an ended session");
            return Err(AppError::auth("session has ended, please log in again"));
        }

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            warn!(user_id = %user.id, "admin endpoint refused");
            return Err(AppError::forbidden("admin access required"));
        }
        Ok(AdminUser(user))
    }
}
