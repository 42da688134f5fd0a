//! Grants the admin role to an already registered user.
//!
//! Usage: `make_admin [email]` (defaults to `admin@rupayana.com`). Reads `DATABASE_URL`.

use anyhow::Context;
use rupayana::{
    account::repo_types::Role,
    auth::services::normalize_email,
    db,
    store::{PgStore, UserRepository},
    telemetry,
};
use tracing::info;

const DEFAULT_ADMIN_EMAIL: &str = "admin@rupayana.com";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let email = std::env::args()
        .nth(1)
        .map(|e| normalize_email(&e))
        .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = db::connect(&database_url, 1).await?;
    db::migrate(&pool).await?;

    let store = PgStore::new(pool);
    if !store.set_role(&email, Role::Admin).await? {
        anyhow::bail!("no user registered with email {email}");
    }

    info!(%email, "admin role granted");
    Ok(())
}
