use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, Totals, TransactionRepository, UserRepository};
use crate::{
    account::repo_types::{NewUser, Role, User},
    ledger::repo_types::{NewTransaction, Transaction},
};

/// Process-local store backing both repositories; used by tests and `AppState::fake`.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    transactions: RwLock<Vec<Transaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }
        let user = user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(phone) = phone {
            user.phone = phone.to_string();
        }
        Ok(Some(user.clone()))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.reset_token = Some(token.to_string());
            user.reset_expires = Some(expires);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };
        if !user.reset_token_matches(token, now) {
            return Ok(false);
        }
        user.password_hash = password_hash.to_string();
        user.reset_token = None;
        user.reset_expires = None;
        user.token_version += 1;
        Ok(true)
    }

    async fn bump_token_version(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.token_version += 1;
        }
        Ok(())
    }

    async fn set_role(&self, email: &str, role: Role) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.values_mut().find(|u| u.email == email) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn insert(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        let tx = tx.into_transaction();
        self.transactions.write().await.push(tx.clone());
        Ok(tx)
    }

    async fn insert_transfer(
        &self,
        debit: NewTransaction,
        credit: NewTransaction,
    ) -> StoreResult<()> {
        // one guard for both legs
        let mut log = self.transactions.write().await;
        log.push(debit.into_transaction());
        log.push(credit.into_transaction());
        Ok(())
    }

    async fn list_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let log = self.transactions.read().await;
        let mut rows: Vec<Transaction> = log
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep reverse insertion order
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn totals(&self) -> StoreResult<Totals> {
        let log = self.transactions.read().await;
        Ok(Totals {
            count: log.len() as i64,
            amount: log.iter().map(|t| t.amount).sum(),
        })
    }
}
