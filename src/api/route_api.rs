// ==========================================
// Delivery Route Back Office - route API
// ==========================================
// Role: route assembly, lifecycle, delivery progress, GPS trajectory
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::route::{NewRoute, Route, RouteTrackPoint};
use crate::domain::types::RouteStatus;
use crate::repository::order_repo::OrderRepository;
use crate::repository::route_repo::{RouteQuery, RouteRepository};

// ==========================================
// Detail DTOs
// ==========================================

/// One stop of a route: assignment + order header data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub order_id: i64,
    pub nf: i64,
    pub customer_name: Option<String>,
    pub delivery_seq: u32,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDetail {
    pub route: Route,
    pub stops: Vec<RouteStop>,
    pub total_weight_kg: f64,
    pub track_point_count: i64,
}

// ==========================================
// RouteApi
// ==========================================

/// Route API
///
/// 1. route listing and detail (stops, load, trajectory size)
/// 2. route creation from a selected order set, capacity-checked
/// 3. lifecycle transitions and per-stop delivery marking
/// 4. GPS trajectory append/read
pub struct RouteApi {
    route_repo: Arc<RouteRepository>,
    order_repo: Arc<OrderRepository>,
}

impl RouteApi {
    pub fn new(route_repo: Arc<RouteRepository>, order_repo: Arc<OrderRepository>) -> Self {
        Self {
            route_repo,
            order_repo,
        }
    }

    pub async fn list_routes(&self, query: RouteQuery) -> ApiResult<Vec<Route>> {
        Ok(self.route_repo.list(&query)?)
    }

    /// Route detail with stops in delivery order and derived load
    pub async fn get_route(&self, id: i64) -> ApiResult<RouteDetail> {
        let route = self
            .route_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Route {id}")))?;

        let assignments = self.route_repo.orders_for_route(id)?;
        let order_ids: Vec<i64> = assignments.iter().map(|a| a.order_id).collect();
        let orders = self.order_repo.find_by_ids(&order_ids)?;
        let by_id: std::collections::HashMap<i64, _> =
            orders.into_iter().map(|o| (o.id, o)).collect();

        let stops = assignments
            .into_iter()
            .filter_map(|a| {
                by_id.get(&a.order_id).map(|order| RouteStop {
                    order_id: a.order_id,
                    nf: order.nf,
                    customer_name: order.customer_name.clone(),
                    delivery_seq: a.delivery_seq,
                    delivered: a.delivered,
                    delivered_at: a.delivered_at,
                })
            })
            .collect();

        let total_weight_kg = self.route_repo.total_weight_kg(id)?;
        let track_point_count = self.route_repo.count_track_points(id)?;

        Ok(RouteDetail {
            route,
            stops,
            total_weight_kg,
            track_point_count,
        })
    }

    /// Create a route from a selected order set
    ///
    /// Delivery sequence follows the position of each id in `order_ids`.
    /// Every order must exist and be unassigned; the combined weight of
    /// the selected orders must fit the route capacity.
    pub async fn create_route(&self, route: NewRoute, order_ids: Vec<i64>) -> ApiResult<i64> {
        if route.max_capacity_kg <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "route capacity must be positive, got {}",
                route.max_capacity_kg
            )));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = order_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ApiError::InvalidInput(format!(
                "order {dup} listed more than once"
            )));
        }

        let found = self.order_repo.find_by_ids(&order_ids)?;
        if found.len() != order_ids.len() {
            let known: std::collections::HashSet<i64> = found.iter().map(|o| o.id).collect();
            let missing: Vec<String> = order_ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(ApiError::NotFound(format!(
                "Order(s) {}",
                missing.join(", ")
            )));
        }

        let totals = self.order_repo.totals_by_order(&order_ids)?;
        let load_kg: f64 = totals.values().map(|t| t.total_weight_kg).sum();
        if load_kg > route.max_capacity_kg {
            return Err(ApiError::BusinessRuleViolation(format!(
                "selected orders weigh {load_kg:.3} kg, exceeding the route capacity of {:.3} kg",
                route.max_capacity_kg
            )));
        }

        let route_id = self.route_repo.create_with_orders(&route, &order_ids)?;
        info!(
            route_id,
            stops = order_ids.len(),
            load_kg,
            "route created"
        );
        Ok(route_id)
    }

    /// Advance the route lifecycle (PLANNED -> IN_PROGRESS -> COMPLETED)
    pub async fn update_route_status(&self, route_id: i64, next: RouteStatus) -> ApiResult<()> {
        self.route_repo.update_status(route_id, next)?;
        info!(route_id, status = %next, "route status updated");
        Ok(())
    }

    /// Mark one stop as delivered
    pub async fn mark_order_delivered(
        &self,
        route_id: i64,
        order_id: i64,
        delivered_at: Option<DateTime<Utc>>,
    ) -> ApiResult<()> {
        let when = delivered_at.unwrap_or_else(Utc::now);
        self.route_repo.mark_delivered(route_id, order_id, when)?;
        Ok(())
    }

    /// Append one GPS sample to the route trajectory
    pub async fn append_track_point(
        &self,
        route_id: i64,
        latitude: f64,
        longitude: f64,
        recorded_at: Option<DateTime<Utc>>,
    ) -> ApiResult<i64> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ApiError::InvalidInput(format!(
                "latitude out of range: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ApiError::InvalidInput(format!(
                "longitude out of range: {longitude}"
            )));
        }

        let when = recorded_at.unwrap_or_else(Utc::now);
        let point_id = self
            .route_repo
            .add_track_point(route_id, latitude, longitude, when)
            .map_err(|e| match e {
                crate::repository::error::RepositoryError::ForeignKeyViolation(_) => {
                    ApiError::NotFound(format!("Route {route_id}"))
                }
                other => other.into(),
            })?;
        Ok(point_id)
    }

    /// Trajectory of a route, oldest sample first
    pub async fn route_track(&self, route_id: i64) -> ApiResult<Vec<RouteTrackPoint>> {
        if self.route_repo.find_by_id(route_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Route {route_id}")));
        }
        Ok(self.route_repo.track_points(route_id)?)
    }
}
