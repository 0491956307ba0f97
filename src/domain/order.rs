// ==========================================
// Delivery Route Back Office - order domain model
// ==========================================
// Order: customer delivery request with a fixed geographic drop point
// OrderItem: (product, quantity) pair within an order
// ==========================================
// Position is immutable once the order is placed. Latitude/longitude are
// optional at the storage level: upstream feeds occasionally deliver orders
// without geocoding, and those orders must survive intake while staying
// invisible to the radius selection.
// ==========================================

use crate::domain::types::GeoPoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Order
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,

    // ===== Invoice / intake data =====
    pub nf: i64,                       // invoice number
    pub customer_name: Option<String>, // denormalized purchaser name
    pub note: Option<String>,
    pub order_date: NaiveDate,

    // ===== Drop point (WGS84 decimal degrees) =====
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // ===== Audit =====
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Drop point of the order, when both coordinates are present
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

// ==========================================
// OrderItem
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: u32, // always positive, enforced at intake and by schema
}

// ==========================================
// Creation payloads
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub nf: i64,
    pub customer_name: Option<String>,
    pub note: Option<String>,
    pub order_date: NaiveDate,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: u32,
}
