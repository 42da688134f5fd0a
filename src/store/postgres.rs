use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{StoreError, StoreResult, Totals, TransactionRepository, UserRepository};
use crate::{
    account::repo_types::{NewUser, Role, User, UserRow},
    ledger::repo_types::{NewTransaction, Transaction, TransactionRow},
};

/// Postgres-backed implementation of both repositories.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_user(row: UserRow) -> StoreResult<User> {
    Ok(User::try_from(row)?)
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate;
        }
    }
    StoreError::Other(anyhow::Error::new(e).context("insert user"))
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, phone, password_hash, role, token_version,
                   reset_token, reset_expires, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        row.map(into_user).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, phone, password_hash, role, token_version,
                   reset_token, reset_expires, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        row.map(into_user).transpose()
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, password_hash, role, token_version,
                      reset_token, reset_expires, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_err)?;
        into_user(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   phone = COALESCE($3, phone)
             WHERE id = $1
            RETURNING id, name, email, phone, password_hash, role, token_version,
                      reset_token, reset_expires, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .fetch_optional(&self.db)
        .await
        .context("update profile")?;
        row.map(into_user).transpose()
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires)
            .execute(&self.db)
            .await
            .context("set reset token")?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $3,
                   reset_token = NULL,
                   reset_expires = NULL,
                   token_version = token_version + 1
             WHERE id = $1
               AND reset_token = $2
               AND reset_expires > $4
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .execute(&self.db)
        .await
        .context("consume reset token")?;
        Ok(res.rows_affected() == 1)
    }

    async fn bump_token_version(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("bump token version")?;
        Ok(())
    }

    async fn set_role(&self, email: &str, role: Role) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE users SET role = $2 WHERE email = $1")
            .bind(email)
            .bind(role.as_str())
            .execute(&self.db)
            .await
            .context("set role")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, phone, password_hash, role, token_version,
                   reset_token, reset_expires, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        rows.into_iter().map(into_user).collect()
    }

    async fn count(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await
            .context("count users")?;
        Ok(n)
    }
}

async fn insert_transaction<'e, E>(exec: E, tx: &NewTransaction) -> anyhow::Result<Transaction>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, TransactionRow>(
        r#"
        INSERT INTO transactions (id, user_id, type, amount, details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, type AS kind, amount, details, created_at
        "#,
    )
    .bind(tx.id)
    .bind(tx.user_id)
    .bind(tx.kind.as_str())
    .bind(tx.amount)
    .bind(tx.details.clone())
    .bind(tx.created_at)
    .fetch_one(exec)
    .await
    .with_context(|| format!("insert {} transaction", tx.kind.as_str()))?;
    Transaction::try_from(row)
}

#[async_trait]
impl TransactionRepository for PgStore {
    async fn insert(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        Ok(insert_transaction(&self.db, &tx).await?)
    }

    async fn insert_transfer(
        &self,
        debit: NewTransaction,
        credit: NewTransaction,
    ) -> StoreResult<()> {
        let mut tx = self.db.begin().await.context("begin transfer")?;
        insert_transaction(&mut *tx, &debit).await?;
        insert_transaction(&mut *tx, &credit).await?;
        tx.commit().await.context("commit transfer")?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, type AS kind, amount, details, created_at
              FROM transactions
             WHERE user_id = $1
             ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list transactions by user")?;
        Ok(rows
            .into_iter()
            .map(Transaction::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    async fn totals(&self) -> StoreResult<Totals> {
        let (count, amount) = sqlx::query_as::<_, (i64, f64)>(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0)::FLOAT8 FROM transactions",
        )
        .fetch_one(&self.db)
        .await
        .context("transaction totals")?;
        Ok(Totals { count, amount })
    }
}
