// ==========================================
// Delivery Route Back Office - route repository
// ==========================================
// Role: routes, route_orders assignments, route_track_points
// Hard rule: no business logic; capacity rules live in the API layer.
//            Assignment uniqueness and status transitions are integrity
//            constraints and are enforced here, inside transactions.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::route::{NewRoute, Route, RouteOrder, RouteTrackPoint};
use crate::domain::types::RouteStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resolve_ordering;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Listing filter for routes
#[derive(Debug, Clone, Default)]
pub struct RouteQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<RouteStatus>,
    pub capacity_min_kg: Option<f64>,
    pub capacity_max_kg: Option<f64>,
    pub ordering: Option<String>, // route_date | status | created_at
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const ORDERING_COLUMNS: [&str; 3] = ["route_date", "status", "created_at"];

const SELECT_COLUMNS: &str = "id, route_date, max_capacity_kg, status, created_at, updated_at";

fn row_to_route(row: &rusqlite::Row<'_>) -> SqliteResult<Route> {
    let status_raw: String = row.get(3)?;
    let status = RouteStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown route status: {status_raw}").into(),
        )
    })?;
    Ok(Route {
        id: row.get(0)?,
        route_date: row.get(1)?,
        max_capacity_kg: row.get(2)?,
        status,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

// ==========================================
// RouteRepository
// ==========================================
pub struct RouteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteRepository {
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

    /// Create a route and assign orders to it in one transaction
    ///
    /// delivery_seq follows the position of each id in `order_ids` (1-based).
    /// The whole creation rolls back when an order id is duplicated, does not
    /// exist, or is already assigned to another route.
    ///
    /// # Returns
    /// - Ok(i64): id of the new route
    pub fn create_with_orders(&self, route: &NewRoute, order_ids: &[i64]) -> RepositoryResult<i64> {
        if route.max_capacity_kg <= 0.0 {
            return Err(RepositoryError::ValidationError(format!(
                "route capacity must be positive, got {}",
                route.max_capacity_kg
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = order_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(RepositoryError::ValidationError(format!(
                "order {dup} listed more than once"
            )));
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let now = Utc::now();
        tx.execute(
            r#"
            INSERT INTO routes (route_date, max_capacity_kg, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![
                route.route_date,
                route.max_capacity_kg,
                RouteStatus::Planned.as_str(),
                now
            ],
        )?;
        let route_id = tx.last_insert_rowid();

        for (index, order_id) in order_ids.iter().enumerate() {
            let assigned: i64 = tx.query_row(
                "SELECT COUNT(*) FROM route_orders WHERE order_id = ?1",
                params![order_id],
                |row| row.get(0),
            )?;
            if assigned > 0 {
                return Err(RepositoryError::ValidationError(format!(
                    "order {order_id} is already assigned to a route"
                )));
            }

            tx.execute(
                r#"
                INSERT INTO route_orders (route_id, order_id, delivery_seq)
                VALUES (?1, ?2, ?3)
                "#,
                params![route_id, order_id, (index + 1) as i64],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(route_id)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM routes WHERE id = ?1"))?;

        let route = stmt.query_row(params![id], row_to_route).optional()?;
        Ok(route)
    }

    /// List routes matching the filter
    pub fn list(&self, query: &RouteQuery) -> RepositoryResult<Vec<Route>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(date_from) = query.date_from {
            conditions.push("route_date >= ?");
            values.push(Box::new(date_from));
        }
        if let Some(date_to) = query.date_to {
            conditions.push("route_date <= ?");
            values.push(Box::new(date_to));
        }
        if let Some(status) = query.status {
            conditions.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(capacity_min) = query.capacity_min_kg {
            conditions.push("max_capacity_kg >= ?");
            values.push(Box::new(capacity_min));
        }
        if let Some(capacity_max) = query.capacity_max_kg {
            conditions.push("max_capacity_kg <= ?");
            values.push(Box::new(capacity_max));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let order_clause =
            resolve_ordering(query.ordering.as_deref(), &ORDERING_COLUMNS, "-created_at")?;

        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM routes{} ORDER BY {}",
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

        let routes = stmt
            .query_map(params_vec.as_slice(), row_to_route)?
            .collect::<SqliteResult<Vec<Route>>>()?;

        Ok(routes)
    }

    /// Assignments of a route, in delivery order
    pub fn orders_for_route(&self, route_id: i64) -> RepositoryResult<Vec<RouteOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT route_id, order_id, delivery_seq, delivered, delivered_at
            FROM route_orders
            WHERE route_id = ?1
            ORDER BY delivery_seq
            "#,
        )?;

        let assignments = stmt
            .query_map(params![route_id], |row| {
                Ok(RouteOrder {
                    route_id: row.get(0)?,
                    order_id: row.get(1)?,
                    delivery_seq: row.get(2)?,
                    delivered: row.get(3)?,
                    delivered_at: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<RouteOrder>>>()?;

        Ok(assignments)
    }

    /// Advance a route's status
    ///
    /// Only the legal lifecycle transitions are accepted
    /// (PLANNED -> IN_PROGRESS -> COMPLETED); anything else is an
    /// InvalidStateTransition. Reads and writes inside one transaction.
    pub fn update_status(&self, route_id: i64, next: RouteStatus) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let current_raw: Option<String> = tx
            .query_row(
                "SELECT status FROM routes WHERE id = ?1",
                params![route_id],
                |row| row.get(0),
            )
            .optional()?;

        let current_raw = current_raw.ok_or_else(|| RepositoryError::NotFound {
            entity: "Route".to_string(),
            id: route_id.to_string(),
        })?;
        let current = RouteStatus::parse(&current_raw).ok_or_else(|| {
            RepositoryError::DatabaseQueryError(format!("unknown route status: {current_raw}"))
        })?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        tx.execute(
            "UPDATE routes SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![next.as_str(), Utc::now(), route_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(())
    }

    /// Mark one assignment as delivered
    pub fn mark_delivered(
        &self,
        route_id: i64,
        order_id: i64,
        delivered_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE route_orders
            SET delivered = 1, delivered_at = ?1
            WHERE route_id = ?2 AND order_id = ?3
            "#,
            params![delivered_at, route_id, order_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RouteOrder".to_string(),
                id: format!("route={route_id} order={order_id}"),
            });
        }

        Ok(())
    }

    /// Append one GPS sample to a route's trajectory
    pub fn add_track_point(
        &self,
        route_id: i64,
        latitude: f64,
        longitude: f64,
        recorded_at: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO route_track_points (route_id, latitude, longitude, recorded_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![route_id, latitude, longitude, recorded_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Trajectory of a route, oldest sample first
    pub fn track_points(&self, route_id: i64) -> RepositoryResult<Vec<RouteTrackPoint>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, route_id, latitude, longitude, recorded_at
            FROM route_track_points
            WHERE route_id = ?1
            ORDER BY recorded_at, id
            "#,
        )?;

        let points = stmt
            .query_map(params![route_id], |row| {
                Ok(RouteTrackPoint {
                    id: row.get(0)?,
                    route_id: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                    recorded_at: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<RouteTrackPoint>>>()?;

        Ok(points)
    }

    /// Number of GPS samples recorded for a route
    pub fn count_track_points(&self, route_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM route_track_points WHERE route_id = ?1",
            params![route_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Total weight of the orders assigned to a route (single join)
    pub fn total_weight_kg(&self, route_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(oi.quantity * p.weight_kg), 0.0)
            FROM route_orders ro
            JOIN order_items oi ON oi.order_id = ro.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE ro.route_id = ?1
            "#,
            params![route_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
