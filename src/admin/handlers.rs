use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{auth::extractors::AdminUser, dto::PublicUser, error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub total_users: i64,
    pub total_transactions: i64,
    pub total_amount: f64,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/reports", get(reports))
}

#[instrument(skip(state, admin))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.users.list().await?;
    info!(admin_id = %admin.0.id, count = users.len(), "admin listed users");
    Ok(Json(UsersResponse {
        users: users.iter().map(PublicUser::from).collect(),
    }))
}

#[instrument(skip(state, _admin))]
pub async fn reports(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ReportResponse>, AppError> {
    let total_users = state.users.count().await?;
    let totals = state.transactions.totals().await?;
    Ok(Json(ReportResponse {
        total_users,
        total_transactions: totals.count,
        total_amount: totals.amount,
    }))
}
