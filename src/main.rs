// ==========================================
// Delivery Route Back Office - main entry
// ==========================================
// Bootstraps the database and reports readiness; front ends talk to the
// library through app::AppState.
// ==========================================

use anyhow::Context;
use delivery_backoffice::app::{get_default_db_path, AppState};
use delivery_backoffice::db;
use delivery_backoffice::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", delivery_backoffice::APP_NAME);
    tracing::info!("version: {}", delivery_backoffice::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("using database: {}", db_path);

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    tracing::info!("initializing application state...");
    let state = AppState::new(db_path.clone())?;

    let order_count = state.order_repo.count_all()?;
    let schema_version = {
        let conn = db::open_sqlite_connection(&db_path)?;
        db::read_schema_version(&conn)?.unwrap_or(0)
    };

    tracing::info!(
        schema_version,
        order_count,
        "application state ready"
    );

    Ok(())
}
