// ==========================================
// Delivery Route Back Office - catalog domain model
// ==========================================
// Family: categorical grouping of products
// Product: belongs to exactly one family
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Family - product family
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for a family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFamily {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

// ==========================================
// Product
// ==========================================
// weight_kg drives route capacity accounting; must be positive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub weight_kg: f64,
    pub volume_m3: Option<f64>,
    pub family_id: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub weight_kg: f64,
    pub volume_m3: Option<f64>,
    pub family_id: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
