// ==========================================
// SQLite connection initialization
// ==========================================
// Goals:
// - one PRAGMA policy for every Connection::open, so foreign keys are
//   never enabled in some modules and disabled in others
// - one busy_timeout, to reduce sporadic busy errors under concurrent writes
// - embedded schema bootstrap (CREATE TABLE IF NOT EXISTS)
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version expected by the current code
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the unified PRAGMA settings to a SQLite connection
///
/// foreign_keys and busy_timeout are per-connection settings and must be
/// applied to every connection, not once per database.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration applied
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read the schema version (None when the table does not exist yet)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create all tables when missing and stamp the schema version
///
/// Idempotent: safe to call on every startup and in every test.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS families (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            weight_kg REAL NOT NULL CHECK (weight_kg > 0),
            volume_m3 REAL,
            family_id INTEGER NOT NULL REFERENCES families(id) ON DELETE RESTRICT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY,
            nf INTEGER NOT NULL,
            customer_name TEXT,
            note TEXT,
            order_date TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS order_items (
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            PRIMARY KEY (order_id, product_id)
        );

        CREATE TABLE IF NOT EXISTS routes (
            id INTEGER PRIMARY KEY,
            route_date TEXT NOT NULL,
            max_capacity_kg REAL NOT NULL CHECK (max_capacity_kg > 0),
            status TEXT NOT NULL DEFAULT 'PLANNED',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS route_orders (
            route_id INTEGER NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            delivery_seq INTEGER NOT NULL,
            delivered INTEGER NOT NULL DEFAULT 0,
            delivered_at TEXT,
            PRIMARY KEY (route_id, order_id),
            UNIQUE (route_id, delivery_seq)
        );

        CREATE TABLE IF NOT EXISTS route_track_points (
            id INTEGER PRIMARY KEY,
            route_id INTEGER NOT NULL REFERENCES routes(id) ON DELETE CASCADE,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_products_family ON products(family_id);
        CREATE INDEX IF NOT EXISTS idx_order_items_product ON order_items(product_id);
        CREATE INDEX IF NOT EXISTS idx_route_orders_order ON route_orders(order_id);
        CREATE INDEX IF NOT EXISTS idx_track_points_route ON route_track_points(route_id, recorded_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
