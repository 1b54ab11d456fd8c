use tracing::info;

use crate::{http_server, AppState, Result};

pub(crate) async fn serve() -> Result<()> {
    let app_state = AppState::from_env().await?;

    info!("About to run migrations (if any to apply)");
    db::migrate(&app_state.db).await?;

    http_server::run_server(app_state).await?;

    info!("Main Returning");

    Ok(())
}

pub(crate) async fn migrate() -> Result<()> {
    let pool = db::setup_db_pool().await?;

    db::migrate(&pool).await?;
    println!("Migrations applied");

    Ok(())
}
