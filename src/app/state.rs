// ==========================================
// Delivery Route Back Office - application state
// ==========================================
// Role: build and hold the shared API instances over one connection
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};

use crate::api::{CatalogApi, OrderApi, RouteApi};
use crate::config::config_manager::ConfigManager;
use crate::db;
use crate::engine::proximity::ProximityEngine;
use crate::repository::family_repo::FamilyRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::route_repo::RouteRepository;

/// Application state
///
/// Holds every API instance plus the repositories that startup
/// diagnostics read directly. All share one SQLite connection.
pub struct AppState {
    /// Database path
    pub db_path: String,

    /// Catalog API (families, products)
    pub catalog_api: Arc<CatalogApi>,

    /// Order API (intake, detail, candidate listing)
    pub order_api: Arc<OrderApi<ConfigManager>>,

    /// Route API (assembly, lifecycle, trajectory)
    pub route_api: Arc<RouteApi>,

    /// Configuration manager
    pub config: Arc<ConfigManager>,

    /// Order repository (startup counts)
    pub order_repo: Arc<OrderRepository>,
}

impl AppState {
    /// Open the database, initialize the schema and wire every service
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        let conn = db::open_sqlite_connection(&db_path)
            .with_context(|| format!("opening database at {db_path}"))?;
        db::init_schema(&conn).context("initializing database schema")?;
        let conn = Arc::new(Mutex::new(conn));

        let family_repo = Arc::new(FamilyRepository::from_connection(conn.clone()));
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let route_repo = Arc::new(RouteRepository::from_connection(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow!(e.to_string()))?,
        );

        let proximity_engine = Arc::new(ProximityEngine::new(order_repo.clone()));

        let catalog_api = Arc::new(CatalogApi::new(family_repo, product_repo));
        let order_api = Arc::new(OrderApi::new(
            order_repo.clone(),
            proximity_engine,
            config.clone(),
        ));
        let route_api = Arc::new(RouteApi::new(route_repo, order_repo.clone()));

        Ok(Self {
            db_path,
            catalog_api,
            order_api,
            route_api,
            config,
            order_repo,
        })
    }
}

/// Default database location: `<data dir>/delivery-backoffice/backoffice.db`
pub fn get_default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("delivery-backoffice")
        .join("backoffice.db")
        .to_string_lossy()
        .into_owned()
}
