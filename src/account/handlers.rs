use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{ProfileQuery, ProfileResponse, UpdateProfileRequest, UpdateProfileResponse};
use crate::{
    auth::{extractors::AuthUser, services::normalize_email},
    dto::PublicUser,
    error::AppError,
    extract::{ApiJson, ApiQuery},
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/update-profile", post(update_profile))
}

#[instrument(skip(state, auth))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(q): ApiQuery<ProfileQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let email = normalize_email(&q.email);
    if email.is_empty() {
        return Err(AppError::validation("email required"));
    }
    auth.ensure_owner_or_admin(&email)?;

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("not found"))?;

    Ok(Json(ProfileResponse {
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(AppError::validation("email required"));
    }
    auth.ensure_owner(&email)?;

    let name = payload.name.as_deref().map(str::trim);
    let phone = payload.phone.as_deref().map(str::trim);

    let user = state
        .users
        .update_profile(auth.0.id, name, phone)
        .await?
        .ok_or_else(|| AppError::not_found("not found"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UpdateProfileResponse {
        success: true,
        user: PublicUser::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::repo_types::Role;

    #[tokio::test]
    async fn owner_can_read_and_update_profile() {
        let state = AppState::fake();
        let user = state.seed_user("Asha", "asha@example.com").await;

        let Json(res) = update_profile(
            State(state.clone()),
            AuthUser(user.clone()),
            ApiJson(UpdateProfileRequest {
                email: "Asha@example.com".into(),
                name: Some(" Asha Rao ".into()),
                phone: None,
            }),
        )
        .await
        .expect("update");
        assert!(res.success);
        assert_eq!(res.user.name, "Asha Rao");
        assert_eq!(res.user.phone, user.phone);

        let Json(res) = get_profile(
            State(state.clone()),
            AuthUser(user.clone()),
            ApiQuery(ProfileQuery { email: "asha@example.com".into() }),
        )
        .await
        .expect("get profile");
        assert_eq!(res.user.name, "Asha Rao");
    }

    #[tokio::test]
    async fn cannot_update_someone_elses_profile() {
        let state = AppState::fake();
        let asha = state.seed_user("Asha", "asha@example.com").await;
        state.seed_user("Ravi", "ravi@example.com").await;

        let err = update_profile(
            State(state.clone()),
            AuthUser(asha),
            ApiJson(UpdateProfileRequest {
                email: "ravi@example.com".into(),
                name: Some("hijacked".into()),
                phone: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let ravi = state.users.find_by_email("ravi@example.com").await.unwrap().unwrap();
        assert_eq!(ravi.name, "Ravi");
    }

    #[tokio::test]
    async fn admin_reads_any_profile_and_gets_404_for_unknown() {
        let state = AppState::fake();
        let mut admin = state.seed_user("Admin", "admin@rupayana.com").await;
        state.users.set_role(&admin.email, Role::Admin).await.unwrap();
        admin.role = Role::Admin;
        state.seed_user("Ravi", "ravi@example.com").await;

        let Json(res) = get_profile(
            State(state.clone()),
            AuthUser(admin.clone()),
            ApiQuery(ProfileQuery { email: "ravi@example.com".into() }),
        )
        .await
        .expect("admin reads profile");
        assert_eq!(res.user.name, "Ravi");

        let err = get_profile(
            State(state),
            AuthUser(admin),
            ApiQuery(ProfileQuery { email: "ghost@example.com".into() }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_email_is_validation_error() {
        let state = AppState::fake();
        let user = state.seed_user("Asha", "asha@example.com").await;
        let err = get_profile(State(state), AuthUser(user), ApiQuery(ProfileQuery::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
