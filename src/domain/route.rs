// ==========================================
// Delivery Route Back Office - route domain model
// ==========================================
// Route: dated delivery run with a capacity ceiling and a status lifecycle
// RouteOrder: assignment of an order to a route, with delivery sequencing
// RouteTrackPoint: one GPS sample of the executed trajectory (append-only)
// ==========================================

use crate::domain::types::RouteStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Route
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub route_date: NaiveDate,
    pub max_capacity_kg: f64,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload for a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoute {
    pub route_date: NaiveDate,
    pub max_capacity_kg: f64,
}

// ==========================================
// RouteOrder - assignment row
// ==========================================
// delivery_seq is 1-based and dense within a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOrder {
    pub route_id: i64,
    pub order_id: i64,
    pub delivery_seq: u32,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
}

// ==========================================
// RouteTrackPoint
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTrackPoint {
    pub id: i64,
    pub route_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}
