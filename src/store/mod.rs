use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    account::repo_types::{NewUser, Role, User},
    ledger::repo_types::{NewTransaction, Transaction},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint hit (email already registered).
    #[error("duplicate entry")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Aggregates over the whole transaction log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub count: i64,
    pub amount: f64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    /// `None` fields keep their stored value. Returns `None` for an unknown id.
    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> StoreResult<Option<User>>;
    async fn set_reset_token(&self, id: Uuid, token: &str, expires: OffsetDateTime)
        -> StoreResult<()>;
    /// Replaces the password hash only if `token` is still the live reset token at `now`,
    /// clearing it and ending every session. Returns whether the reset happened.
    async fn consume_reset_token(
        &self,
        id: Uuid,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<bool>;
    /// Invalidates every bearer token issued to the user so far.
    async fn bump_token_version(&self, id: Uuid) -> StoreResult<()>;
    /// Returns false when no user has that email.
    async fn set_role(&self, email: &str, role: Role) -> StoreResult<bool>;
    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn count(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, tx: NewTransaction) -> StoreResult<Transaction>;
    /// Writes both legs or neither.
    async fn insert_transfer(&self, debit: NewTransaction, credit: NewTransaction)
        -> StoreResult<()>;
    /// Newest first; rows created at the same instant come back in reverse insertion order.
    async fn list_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>>;
    async fn totals(&self) -> StoreResult<Totals>;
}
