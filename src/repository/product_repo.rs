// ==========================================
// Delivery Route Back Office - product repository
// ==========================================
// Role: CRUD for the products table
// Hard rule: no business logic, data access only
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::catalog::{NewProduct, Product};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resolve_ordering;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// Listing filter for products
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub name_contains: Option<String>,
    pub family_id: Option<i64>,
    pub weight_min_kg: Option<f64>,
    pub weight_max_kg: Option<f64>,
    pub active: Option<bool>,
    pub ordering: Option<String>, // name | weight_kg | created_at
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const ORDERING_COLUMNS: [&str; 3] = ["name", "weight_kg", "created_at"];

const SELECT_COLUMNS: &str = "id, name, weight_kg, volume_m3, family_id, active, created_at";

fn row_to_product(row: &rusqlite::Row<'_>) -> SqliteResult<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        weight_kg: row.get(2)?,
        volume_m3: row.get(3)?,
        family_id: row.get(4)?,
        active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// ==========================================
// ProductRepository
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build a repository over an already-open shared connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a product and return its id
    ///
    /// The family must exist (FOREIGN KEY) and the weight must be positive
    /// (schema CHECK); both failures surface as repository errors.
    pub fn insert(&self, product: &NewProduct) -> RepositoryResult<i64> {
        if product.name.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "product name must not be empty".to_string(),
            ));
        }
        if product.weight_kg <= 0.0 {
            return Err(RepositoryError::ValidationError(format!(
                "product weight must be positive, got {}",
                product.weight_kg
            )));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO products (name, weight_kg, volume_m3, family_id, active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                product.name.trim(),
                product.weight_kg,
                product.volume_m3,
                product.family_id,
                product.active,
                Utc::now()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = ?1"
        ))?;

        let product = stmt.query_row(params![id], row_to_product).optional()?;
        Ok(product)
    }

    /// List products matching the filter
    pub fn list(&self, query: &ProductQuery) -> RepositoryResult<Vec<Product>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = query.name_contains {
            conditions.push("name LIKE '%' || ? || '%'");
            values.push(Box::new(name.clone()));
        }
        if let Some(family_id) = query.family_id {
            conditions.push("family_id = ?");
            values.push(Box::new(family_id));
        }
        if let Some(weight_min) = query.weight_min_kg {
            conditions.push("weight_kg >= ?");
            values.push(Box::new(weight_min));
        }
        if let Some(weight_max) = query.weight_max_kg {
            conditions.push("weight_kg <= ?");
            values.push(Box::new(weight_max));
        }
        if let Some(active) = query.active {
            conditions.push("active = ?");
            values.push(Box::new(active));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let order_clause = resolve_ordering(query.ordering.as_deref(), &ORDERING_COLUMNS, "name")?;

        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM products{} ORDER BY {}",
            where_clause, order_clause
        );
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(limit));
            if let Some(offset) = query.offset {
                sql.push_str(" OFFSET ?");
                values.push(Box::new(offset));
            }
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let params_vec: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let products = stmt
            .query_map(params_vec.as_slice(), row_to_product)?
            .collect::<SqliteResult<Vec<Product>>>()?;

        Ok(products)
    }
}
