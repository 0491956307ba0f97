// ==========================================
// Delivery Route Back Office - family repository
// ==========================================
// Role: CRUD for the families table
// Hard rule: no business logic, data access only
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::catalog::{Family, NewFamily};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resolve_ordering;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// Listing filter for families
#[derive(Debug, Clone, Default)]
pub struct FamilyQuery {
    pub name_contains: Option<String>,
    pub active: Option<bool>,
    pub ordering: Option<String>, // name | created_at, "-" prefix for DESC
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const ORDERING_COLUMNS: [&str; 2] = ["name", "created_at"];

// ==========================================
// FamilyRepository
// ==========================================
pub struct FamilyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FamilyRepository {
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

    /// Insert a family and return its id
    pub fn insert(&self, family: &NewFamily) -> RepositoryResult<i64> {
        if family.name.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "family name must not be empty".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO families (name, description, active, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                family.name.trim(),
                family.description,
                family.active,
                Utc::now()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Family>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, description, active, created_at
            FROM families
            WHERE id = ?1
            "#,
        )?;

        let family = stmt
            .query_row(params![id], |row| {
                Ok(Family {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    active: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .optional()?;

        Ok(family)
    }

    /// List families matching the filter
    ///
    /// # Arguments
    /// - query: name substring (case-insensitive), active flag, ordering,
    ///   limit/offset pagination
    pub fn list(&self, query: &FamilyQuery) -> RepositoryResult<Vec<Family>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = query.name_contains {
            conditions.push("name LIKE '%' || ? || '%'");
            values.push(Box::new(name.clone()));
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
            "SELECT id, name, description, active, created_at FROM families{} ORDER BY {}",
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

        let families = stmt
            .query_map(params_vec.as_slice(), |row| {
                Ok(Family {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    active: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<Family>>>()?;

        Ok(families)
    }

    /// Count active products belonging to a family
    pub fn count_active_products(&self, family_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM products WHERE family_id = ?1 AND active = 1",
            params![family_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
