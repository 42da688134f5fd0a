use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    account::repo_types::NewUser,
    auth::{
        dto::{
            AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest, ResetRequest,
            ResetRequestResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, validate_password, verify_password},
        services::{generate_reset_token, is_valid_email, normalize_email, reset_link},
    },
    config::clamp_ttl,
    dto::{MessageResponse, PublicUser},
    error::AppError,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/request-reset", post(request_reset))
        .route("/forgot-password", post(request_reset))
        .route("/reset-password", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("email and password required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("invalid email"));
    }
    validate_password(&payload.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    // the unique index still catches a concurrent registration
    let user = state
        .users
        .create(NewUser::new(&payload.name, &email, &payload.phone, hash))
        .await?;

    let token = JwtKeys::from_ref(&state).sign(user.id, user.token_version)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        success: true,
        user: PublicUser::from(&user),
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("email and password required"));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::auth("Invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::auth("Invalid credentials"));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id, user.token_version)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        user: PublicUser::from(&user),
        token,
    }))
}

#[instrument(skip(state, auth))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let AuthUser(user) = auth;
    state.users.bump_token_version(user.id).await?;
    info!(user_id = %user.id, "user logged out");
    Ok(Json(MessageResponse::ok("Logged out")))
}

const RESET_SENT_MESSAGE: &str = "Reset link sent if email exists";

/// Always answers 200 with the same message for unknown or missing emails so accounts cannot be
/// enumerated. The link goes out by mail when a relay is configured.
#[instrument(skip(state, payload))]
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetRequest>,
) -> Result<Json<ResetRequestResponse>, AppError> {
    let mut response = ResetRequestResponse {
        success: true,
        message: RESET_SENT_MESSAGE.into(),
        reset_link: None,
    };

    let email = normalize_email(&payload.email);
    if email.is_empty() {
        info!("reset requested without an email");
        return Ok(Json(response));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        info!(email = %email, "reset requested for unknown email");
        return Ok(Json(response));
    };

    let cfg = &state.config.reset;
    let token = generate_reset_token();
    let expires = OffsetDateTime::now_utc() + Duration::minutes(clamp_ttl(cfg.ttl_minutes));
    state.users.set_reset_token(user.id, &token, expires).await?;

    let link = reset_link(&cfg.frontend_base, &token, &user.email);
    info!(user_id = %user.id, reset_link = %link, "password reset issued");

    if let Some(mailer) = &state.mailer {
        mailer.send_reset_link(&user.email, &link).await?;
        info!(user_id = %user.id, "reset link mailed");
    } else if cfg.link_in_response {
        response.message = "No SMTP configured, use this link for testing".into();
        response.reset_link = Some(link);
    }
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.token.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::validation("email, token and newPassword required"));
    }

    let invalid = || AppError::validation("Invalid or expired token");
    let now = OffsetDateTime::now_utc();

    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;
    if !user.reset_token_matches(&payload.token, now) {
        warn!(user_id = %user.id, "reset with invalid or expired token");
        return Err(invalid());
    }
    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    if !state
        .users
        .consume_reset_token(user.id, &payload.token, &hash, now)
        .await?
    {
        // lost a race with another reset
        return Err(invalid());
    }

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse::ok("Password updated")))
}
