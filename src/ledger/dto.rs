use serde::{Deserialize, Serialize};

use super::repo_types::Transaction;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_email: String,
    pub to_email: String,
    pub amount: Option<f64>,
    pub mode: Option<String>, // "upi", "bank", ...
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BillPayRequest {
    pub email: String,
    pub biller: String,
    pub amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionsQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}
