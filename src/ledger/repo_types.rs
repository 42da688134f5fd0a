use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Debit,
    Credit,
    Bill,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Debit => "debit",
            TxKind::Credit => "credit",
            TxKind::Bill => "bill",
        }
    }
}

impl FromStr for TxKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(TxKind::Debit),
            "credit" => Ok(TxKind::Credit),
            "bill" => Ok(TxKind::Bill),
            other => anyhow::bail!("unknown transaction type {other:?}"),
        }
    }
}

/// Raw `transactions` row; queries alias the `type` column to `kind`.
#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount: f64,
    pub details: serde_json::Value,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub amount: f64,
    pub details: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            kind: r.kind.parse()?,
            amount: r.amount,
            details: r.details,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TxKind,
    pub amount: f64,
    pub details: serde_json::Value,
    pub created_at: OffsetDateTime,
}

impl NewTransaction {
    pub fn new(user_id: Uuid, kind: TxKind, amount: f64, details: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            details,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind,
            amount: self.amount,
            details: self.details,
            created_at: self.created_at,
        }
    }
}
