use color_eyre::{eyre::Context, Result};
use sqlx::postgres::PgPoolOptions;

pub mod auth_tokens;
pub mod cooking;
pub mod subscriptions;
pub mod users;

pub use sqlx;
pub use sqlx::PgPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[tracing::instrument(err)]
pub async fn setup_db_pool() -> Result<PgPool> {
    let database_url =
        std::env::var("DATABASE_URL").wrap_err("Missing DATABASE_URL, needed for app launch")?;
    let max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
        Ok(value) => value
            .parse()
            .wrap_err("DB_MAX_CONNECTIONS must be a positive integer")?,
        Err(_) => DEFAULT_MAX_CONNECTIONS,
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .wrap_err("Failed to connect to the database")?;

    Ok(pool)
}

#[tracing::instrument(err, skip(pool))]
pub async fn migrate(pool: &PgPool) -> Result<()> {
    const MIGRATION_LOCK_ID: i64 = 0x00F0_0D6F_A3B0_0C;

    // Advisory locks belong to the session, so lock and unlock on one connection
    let mut conn = pool.acquire().await?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&mut *conn)
        .await?;

    let migrated = sqlx::migrate!().run(&mut *conn).await;

    let unlocked: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(&mut *conn)
        .await?;

    if unlocked {
        tracing::info!("Migration lock unlocked");
    } else {
        tracing::warn!("Failed to unlock migration lock");
    }

    migrated.wrap_err("Failed to run migrations")
}
