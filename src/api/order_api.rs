// ==========================================
// Delivery Route Back Office - order API
// ==========================================
// Role: order intake, detail, and the composed candidate listing
//       (non-geographic predicates + proximity selection)
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::listing_config_trait::ListingConfigReader;
use crate::domain::order::{NewOrder, Order};
use crate::engine::proximity::{ProximityEngine, RadiusSelection};
use crate::repository::error::RepositoryError;
use crate::repository::order_repo::{OrderItemRow, OrderQuery, OrderRepository};

// ==========================================
// OrderListParams - wire-level listing parameters
// ==========================================
// Field names on the wire keep the legacy query-string vocabulary
// (serde renames); the struct itself speaks the domain language.
// pedido_base / raio_km stay raw strings end-to-end: whether a present
// but malformed value differs from an absent one is decided by the
// proximity engine, never by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    pub nf: Option<i64>,

    /// Substring match on the purchaser name
    #[serde(rename = "usuario")]
    pub customer_name: Option<String>,

    #[serde(rename = "data_inicio")]
    pub date_from: Option<NaiveDate>,

    #[serde(rename = "data_fim")]
    pub date_to: Option<NaiveDate>,

    /// true: only orders not yet assigned to a route
    #[serde(rename = "disponivel_para_rota")]
    pub available_for_route: Option<bool>,

    /// Comma-separated family id list
    #[serde(rename = "familias")]
    pub families: Option<String>,

    /// Reference order id for the radius filter (raw)
    #[serde(rename = "pedido_base")]
    pub reference_order_id: Option<String>,

    /// Radius in kilometers (raw)
    #[serde(rename = "raio_km")]
    pub radius_km: Option<String>,

    /// order_date | nf | created_at, "-" prefix for descending
    pub ordering: Option<String>,

    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

// ==========================================
// Listing / detail DTOs
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub nf: i64,
    pub customer_name: Option<String>,
    pub order_date: NaiveDate,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub item_count: i64,
    pub total_weight_kg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDetail {
    pub product_id: i64,
    pub product_name: String,
    pub family_id: i64,
    pub family_name: String,
    pub quantity: u32,
    pub line_weight_kg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub total_weight_kg: f64,
}

// ==========================================
// OrderApi
// ==========================================

/// Order API
///
/// 1. candidate listing for route assembly (all predicates composed)
/// 2. order detail (items with product/family names)
/// 3. order intake
pub struct OrderApi<C>
where
    C: ListingConfigReader,
{
    order_repo: Arc<OrderRepository>,
    proximity_engine: Arc<ProximityEngine>,
    config: Arc<C>,
}

impl<C> OrderApi<C>
where
    C: ListingConfigReader,
{
    pub fn new(
        order_repo: Arc<OrderRepository>,
        proximity_engine: Arc<ProximityEngine>,
        config: Arc<C>,
    ) -> Self {
        Self {
            order_repo,
            proximity_engine,
            config,
        }
    }

    /// List orders for route assembly.
    ///
    /// The non-geographic predicates run in SQL and produce the candidate
    /// pool; the proximity engine then narrows that pool (or passes it
    /// through when the radius parameters are absent). Pagination applies
    /// to the narrowed result, so a radius search never loses candidates
    /// to a page boundary.
    pub async fn list_orders(&self, params: OrderListParams) -> ApiResult<Vec<OrderSummary>> {
        let family_ids = parse_family_list(params.families.as_deref())?;
        let (page_size, offset) = self.resolve_page(&params).await?;

        let query = OrderQuery {
            nf: params.nf,
            customer_name_contains: params.customer_name.clone(),
            date_from: params.date_from,
            date_to: params.date_to,
            available_for_route: params.available_for_route,
            family_ids,
            ordering: params.ordering.clone(),
            limit: None,
            offset: None,
        };

        let pool = self.order_repo.list(&query)?;
        debug!(pool_size = pool.len(), "candidate pool assembled");

        let selection = self.proximity_engine.apply(
            params.reference_order_id.as_deref(),
            params.radius_km.as_deref(),
            &pool,
        )?;

        let narrowed: Vec<Order> = match selection {
            RadiusSelection::Passthrough => pool,
            RadiusSelection::Selected(ids) => {
                let keep: std::collections::HashSet<i64> = ids.into_iter().collect();
                pool.into_iter().filter(|o| keep.contains(&o.id)).collect()
            }
        };

        let page: Vec<Order> = narrowed
            .into_iter()
            .skip(offset as usize)
            .take(page_size as usize)
            .collect();

        let ids: Vec<i64> = page.iter().map(|o| o.id).collect();
        let totals = self.order_repo.totals_by_order(&ids)?;

        Ok(page
            .into_iter()
            .map(|order| {
                let t = totals.get(&order.id).copied().unwrap_or_default();
                OrderSummary {
                    id: order.id,
                    nf: order.nf,
                    customer_name: order.customer_name,
                    order_date: order.order_date,
                    latitude: order.latitude,
                    longitude: order.longitude,
                    item_count: t.item_count,
                    total_weight_kg: t.total_weight_kg,
                }
            })
            .collect())
    }

    /// Order detail with items and derived totals
    pub async fn get_order(&self, id: i64) -> ApiResult<OrderDetail> {
        let order = self
            .order_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Order {id}")))?;

        let items: Vec<OrderItemDetail> = self
            .order_repo
            .item_rows_for_order(id)?
            .into_iter()
            .map(
                |OrderItemRow {
                     product_id,
                     product_name,
                     family_id,
                     family_name,
                     quantity,
                     line_weight_kg,
                 }| OrderItemDetail {
                    product_id,
                    product_name,
                    family_id,
                    family_name,
                    quantity,
                    line_weight_kg,
                },
            )
            .collect();
        let total_weight_kg = items.iter().map(|i| i.line_weight_kg).sum();

        Ok(OrderDetail {
            order,
            items,
            total_weight_kg,
        })
    }

    /// Register a new order with its items
    ///
    /// # Arguments
    /// - order: intake payload; coordinates are optional but must come in
    ///   pairs and stay inside WGS84 bounds
    pub async fn create_order(&self, order: NewOrder) -> ApiResult<i64> {
        if order.items.is_empty() {
            return Err(ApiError::InvalidInput(
                "an order must carry at least one item".to_string(),
            ));
        }
        if order.latitude.is_some() != order.longitude.is_some() {
            return Err(ApiError::InvalidInput(
                "latitude and longitude must be provided together".to_string(),
            ));
        }
        if let Some(lat) = order.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ApiError::InvalidInput(format!(
                    "latitude out of range: {lat}"
                )));
            }
        }
        if let Some(lon) = order.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::InvalidInput(format!(
                    "longitude out of range: {lon}"
                )));
            }
        }

        self.order_repo.insert(&order).map_err(|e| match e {
            // Unknown product ids are a caller mistake, not a database fault
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("unknown product in items: {msg}"))
            }
            other => other.into(),
        })
    }

    /// Resolve page/page_size against the configured bounds
    ///
    /// # Returns
    /// - (page_size, offset)
    async fn resolve_page(&self, params: &OrderListParams) -> ApiResult<(i64, i64)> {
        let default_size = self
            .config
            .get_default_page_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let max_size = self
            .config
            .get_max_page_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::InvalidInput(format!(
                "page must be >= 1, got {page}"
            )));
        }

        let page_size = params.page_size.unwrap_or(default_size).clamp(1, max_size);
        Ok((page_size, (page - 1) * page_size))
    }
}

/// Parse the comma-separated `familias` parameter
fn parse_family_list(raw: Option<&str>) -> ApiResult<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::InvalidInput(format!("invalid family id: {part}")))
        })
        .collect()
}
