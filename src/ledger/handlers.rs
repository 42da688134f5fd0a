use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{
    dto::{BillPayRequest, TransactionsQuery, TransactionsResponse, TransferRequest},
    repo_types::{NewTransaction, TxKind},
};
use crate::{
    auth::{extractors::AuthUser, services::normalize_email},
    dto::MessageResponse,
    error::AppError,
    extract::{ApiJson, ApiQuery},
    state::AppState,
};

pub fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/transfer", post(transfer))
        .route("/billpay", post(bill_pay))
        .route("/transactions", get(list_transactions))
}

fn positive_amount(amount: f64) -> Result<f64, AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("amount must be a positive number"));
    }
    Ok(amount)
}

/// Both users are resolved before anything is written; the two legs land together.
#[instrument(skip(state, auth, payload))]
pub async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<TransferRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let from_email = normalize_email(&payload.from_email);
    let to_email = normalize_email(&payload.to_email);
    if from_email.is_empty() || to_email.is_empty() {
        return Err(AppError::validation("missing fields"));
    }
    let Some(amount) = payload.amount else {
        return Err(AppError::validation("missing fields"));
    };
    let amount = positive_amount(amount)?;
    auth.ensure_owner(&from_email)?;

    let sender = state.users.find_by_email(&from_email).await?;
    let recipient = state.users.find_by_email(&to_email).await?;
    let (Some(sender), Some(recipient)) = (sender, recipient) else {
        warn!(from = %from_email, to = %to_email, "transfer between unknown users");
        return Err(AppError::validation("invalid users"));
    };

    let mode = payload
        .mode
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let debit = NewTransaction::new(
        sender.id,
        TxKind::Debit,
        amount,
        json!({ "to": recipient.email, "mode": mode }),
    );
    let credit = NewTransaction::new(
        recipient.id,
        TxKind::Credit,
        amount,
        json!({ "from": sender.email, "mode": mode }),
    );
    state.transactions.insert_transfer(debit, credit).await?;

    info!(from = %sender.id, to = %recipient.id, amount, "transfer recorded");
    Ok(Json(MessageResponse::ok("Transfer recorded")))
}

#[instrument(skip(state, auth, payload))]
pub async fn bill_pay(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<BillPayRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email);
    let biller = payload.biller.trim();
    if email.is_empty() || biller.is_empty() {
        return Err(AppError::validation("missing fields"));
    }
    let Some(amount) = payload.amount else {
        return Err(AppError::validation("missing fields"));
    };
    let amount = positive_amount(amount)?;
    auth.ensure_owner(&email)?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(AppError::validation("invalid user"));
    };

    let tx = state
        .transactions
        .insert(NewTransaction::new(
            user.id,
            TxKind::Bill,
            amount,
            json!({ "biller": biller }),
        ))
        .await?;

    info!(user_id = %user.id, tx_id = %tx.id, amount, "bill payment recorded");
    Ok(Json(MessageResponse::ok("Bill payment recorded")))
}

#[instrument(skip(state, auth))]
pub async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(q): ApiQuery<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let email = normalize_email(&q.email);
    if email.is_empty() {
        return Err(AppError::validation("email required"));
    }
    auth.ensure_owner_or_admin(&email)?;

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let transactions = state.transactions.list_by_user(user.id).await?;
    Ok(Json(TransactionsResponse { transactions }))
}
