// ==========================================
// Delivery Route Back Office - configuration manager
// ==========================================
// Role: configuration load, query, override
// Storage: config_kv table (key-value)
// ==========================================

use crate::config::listing_config_trait::ListingConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ===== Defaults =====
const DEFAULT_PAGE_SIZE: i64 = 50;
const DEFAULT_MAX_PAGE_SIZE: i64 = 200;
const DEFAULT_MAX_RADIUS_KM: f64 = 100.0;

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build a manager over an already-open shared connection
    ///
    /// Re-applies the unified PRAGMA settings to the passed connection
    /// (idempotent), so behavior does not depend on who opened it.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| format!("lock acquisition failed: {e}"))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// Read a raw configuration value
    ///
    /// # Returns
    /// - Some(String): stored value
    /// - None: key not present (caller falls back to its default)
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("lock acquisition failed: {e}"))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Store a configuration value (insert or overwrite)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("lock acquisition failed: {e}"))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("config key {key} is not an integer: {e}").into()),
            None => Ok(default),
        }
    }

    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("config key {key} is not a number: {e}").into()),
            None => Ok(default),
        }
    }
}

#[async_trait]
impl ListingConfigReader for ConfigManager {
    async fn get_default_page_size(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or("listing_default_page_size", DEFAULT_PAGE_SIZE)
    }

    async fn get_max_page_size(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or("listing_max_page_size", DEFAULT_MAX_PAGE_SIZE)
    }

    async fn get_max_radius_km(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or("proximity_max_radius_km", DEFAULT_MAX_RADIUS_KM)
    }
}
