// ==========================================
// Delivery Route Back Office - order repository
// ==========================================
// Role: CRUD for orders and order_items, candidate-pool listing,
//       batched family lookups for the proximity engine
// Hard rule: no business logic, data access only
// Constraint: all queries are parameterized
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::{NewOrder, Order, OrderItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resolve_ordering;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Listing filter for orders (the non-geographic candidate-pool predicates)
///
/// All predicates compose conjunctively. The geographic radius filter is NOT
/// part of this query: it runs in the engine layer over the pool this
/// listing produces.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub nf: Option<i64>,
    pub customer_name_contains: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// true: only orders not assigned to any route
    /// false: only orders already assigned to some route
    pub available_for_route: Option<bool>,
    /// Orders having at least one item whose product belongs to one of
    /// these families. Empty means no family filter.
    pub family_ids: Vec<i64>,
    pub ordering: Option<String>, // order_date | nf | created_at
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Aggregates derived from an order's items (batched lookup)
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderTotals {
    pub item_count: i64,
    pub total_weight_kg: f64,
}

/// One order item joined with its product and family names (detail view)
#[derive(Debug, Clone)]
pub struct OrderItemRow {
    pub product_id: i64,
    pub product_name: String,
    pub family_id: i64,
    pub family_name: String,
    pub quantity: u32,
    pub line_weight_kg: f64,
}

const ORDERING_COLUMNS: [&str; 3] = ["order_date", "nf", "created_at"];

const SELECT_COLUMNS: &str =
    "id, nf, customer_name, note, order_date, latitude, longitude, created_at";

// SQLite caps host parameters; stay well under the historical 999 limit
const IN_CHUNK_SIZE: usize = 900;

fn row_to_order(row: &rusqlite::Row<'_>) -> SqliteResult<Order> {
    Ok(Order {
        id: row.get(0)?,
        nf: row.get(1)?,
        customer_name: row.get(2)?,
        note: row.get(3)?,
        order_date: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        created_at: row.get(7)?,
    })
}

// ==========================================
// OrderRepository
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
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

    /// Insert an order with its items in one transaction
    ///
    /// # Arguments
    /// - order: intake payload; must carry at least one item, every quantity
    ///   positive, coordinates either both present or both absent
    ///
    /// # Returns
    /// - Ok(i64): id of the new order
    pub fn insert(&self, order: &NewOrder) -> RepositoryResult<i64> {
        if order.items.is_empty() {
            return Err(RepositoryError::ValidationError(
                "an order must carry at least one item".to_string(),
            ));
        }
        if let Some(item) = order.items.iter().find(|i| i.quantity == 0) {
            return Err(RepositoryError::ValidationError(format!(
                "item quantity must be positive (product_id={})",
                item.product_id
            )));
        }
        if order.latitude.is_some() != order.longitude.is_some() {
            return Err(RepositoryError::ValidationError(
                "latitude and longitude must be provided together".to_string(),
            ));
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO orders (nf, customer_name, note, order_date, latitude, longitude, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                order.nf,
                order.customer_name,
                order.note,
                order.order_date,
                order.latitude,
                order.longitude,
                Utc::now()
            ],
        )?;
        let order_id = tx.last_insert_rowid();

        for item in &order.items {
            tx.execute(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity)
                VALUES (?1, ?2, ?3)
                "#,
                params![order_id, item.product_id, item.quantity],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(order_id)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id = ?1"))?;

        let order = stmt.query_row(params![id], row_to_order).optional()?;
        Ok(order)
    }

    pub fn items_for_order(&self, order_id: i64) -> RepositoryResult<Vec<OrderItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT order_id, product_id, quantity
            FROM order_items
            WHERE order_id = ?1
            ORDER BY product_id
            "#,
        )?;

        let items = stmt
            .query_map(params![order_id], |row| {
                Ok(OrderItem {
                    order_id: row.get(0)?,
                    product_id: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<OrderItem>>>()?;

        Ok(items)
    }

    /// List orders matching the candidate-pool predicates
    ///
    /// # Arguments
    /// - query: see [`OrderQuery`]; predicates compose with AND
    pub fn list(&self, query: &OrderQuery) -> RepositoryResult<Vec<Order>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(nf) = query.nf {
            conditions.push("nf = ?".to_string());
            values.push(Box::new(nf));
        }
        if let Some(ref name) = query.customer_name_contains {
            conditions.push("customer_name LIKE '%' || ? || '%'".to_string());
            values.push(Box::new(name.clone()));
        }
        if let Some(date_from) = query.date_from {
            conditions.push("order_date >= ?".to_string());
            values.push(Box::new(date_from));
        }
        if let Some(date_to) = query.date_to {
            conditions.push("order_date <= ?".to_string());
            values.push(Box::new(date_to));
        }
        match query.available_for_route {
            Some(true) => {
                conditions.push("id NOT IN (SELECT order_id FROM route_orders)".to_string());
            }
            Some(false) => {
                conditions.push("id IN (SELECT order_id FROM route_orders)".to_string());
            }
            None => {}
        }
        if !query.family_ids.is_empty() {
            let placeholders = std::iter::repeat("?")
                .take(query.family_ids.len())
                .collect::<Vec<_>>()
                .join(", ");
            conditions.push(format!(
                "id IN (SELECT DISTINCT oi.order_id FROM order_items oi \
                 JOIN products p ON p.id = oi.product_id \
                 WHERE p.family_id IN ({placeholders}))"
            ));
            for family_id in &query.family_ids {
                values.push(Box::new(*family_id));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let order_clause =
            resolve_ordering(query.ordering.as_deref(), &ORDERING_COLUMNS, "-created_at")?;

        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM orders{} ORDER BY {}",
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

        let orders = stmt
            .query_map(params_vec.as_slice(), row_to_order)?
            .collect::<SqliteResult<Vec<Order>>>()?;

        Ok(orders)
    }

    /// Fetch several orders by id (single IN query per chunk)
    ///
    /// Missing ids are simply absent from the result; callers decide
    /// whether that is an error.
    pub fn find_by_ids(&self, order_ids: &[i64]) -> RepositoryResult<Vec<Order>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut orders = Vec::with_capacity(order_ids.len());

        for chunk in order_ids.chunks(IN_CHUNK_SIZE) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");

            let sql =
                format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id IN ({placeholders})");

            let mut stmt = conn.prepare(&sql)?;
            let params_vec: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

            let rows = stmt
                .query_map(params_vec.as_slice(), row_to_order)?
                .collect::<SqliteResult<Vec<Order>>>()?;
            orders.extend(rows);
        }

        Ok(orders)
    }

    /// Items of an order joined with product and family names
    pub fn item_rows_for_order(&self, order_id: i64) -> RepositoryResult<Vec<OrderItemRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT oi.product_id, p.name, p.family_id, f.name,
                   oi.quantity, oi.quantity * p.weight_kg
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            JOIN families f ON f.id = p.family_id
            WHERE oi.order_id = ?1
            ORDER BY oi.product_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![order_id], |row| {
                Ok(OrderItemRow {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    family_id: row.get(2)?,
                    family_name: row.get(3)?,
                    quantity: row.get(4)?,
                    line_weight_kg: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<OrderItemRow>>>()?;

        Ok(rows)
    }

    /// Batch-read the family-id set of every given order
    ///
    /// One IN-join per chunk instead of one query per order item; the
    /// proximity engine calls this once per selection, before its loop.
    /// Orders without items are absent from the map.
    ///
    /// # Returns
    /// - Ok(HashMap<i64, HashSet<i64>>): order_id -> distinct family ids
    pub fn family_ids_by_order(
        &self,
        order_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, HashSet<i64>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.get_conn()?;
        let mut result: HashMap<i64, HashSet<i64>> = HashMap::with_capacity(order_ids.len());

        for chunk in order_ids.chunks(IN_CHUNK_SIZE) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                "SELECT DISTINCT oi.order_id, p.family_id \
                 FROM order_items oi \
                 JOIN products p ON p.id = oi.product_id \
                 WHERE oi.order_id IN ({placeholders})"
            );

            let mut stmt = conn.prepare(&sql)?;
            let params_vec: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

            let rows = stmt.query_map(params_vec.as_slice(), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;

            for row in rows {
                let (order_id, family_id) = row?;
                result.entry(order_id).or_default().insert(family_id);
            }
        }

        Ok(result)
    }

    /// Batch-read item count and total weight of every given order
    ///
    /// # Returns
    /// - Ok(HashMap<i64, OrderTotals>): order_id -> aggregates; orders
    ///   without items are absent
    pub fn totals_by_order(&self, order_ids: &[i64]) -> RepositoryResult<HashMap<i64, OrderTotals>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.get_conn()?;
        let mut result: HashMap<i64, OrderTotals> = HashMap::with_capacity(order_ids.len());

        for chunk in order_ids.chunks(IN_CHUNK_SIZE) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                "SELECT oi.order_id, COUNT(*), SUM(oi.quantity * p.weight_kg) \
                 FROM order_items oi \
                 JOIN products p ON p.id = oi.product_id \
                 WHERE oi.order_id IN ({placeholders}) \
                 GROUP BY oi.order_id"
            );

            let mut stmt = conn.prepare(&sql)?;
            let params_vec: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

            let rows = stmt.query_map(params_vec.as_slice(), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    OrderTotals {
                        item_count: row.get(1)?,
                        total_weight_kg: row.get(2)?,
                    },
                ))
            })?;

            for row in rows {
                let (order_id, totals) = row?;
                result.insert(order_id, totals);
            }
        }

        Ok(result)
    }

    /// Total number of orders (startup diagnostics)
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        Ok(count)
    }
}
