// ==========================================
// Delivery Route Back Office - core library
// ==========================================
// Stack: Rust + SQLite
// Role: order catalog, route assembly, proximity-based order selection
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - selection rules
pub mod engine;

// Config layer - system configuration
pub mod config;

// Database infrastructure (connection init / unified PRAGMA)
pub mod db;

// Logging
pub mod logging;

// API layer - application services
pub mod api;

// App layer - state wiring
pub mod app;

// ==========================================
// Re-exports of core types
// ==========================================

// Domain types
pub use domain::types::{GeoPoint, RouteStatus};

// Domain entities
pub use domain::{
    Family, NewFamily, NewOrder, NewOrderItem, NewProduct, NewRoute, Order, OrderItem, Product,
    Route, RouteOrder, RouteTrackPoint,
};

// Engine
pub use engine::{AlwaysCompatible, FamilyCompatibility, ProximityEngine, RadiusSelection};

// API
pub use api::{CatalogApi, OrderApi, RouteApi};

// ==========================================
// Constants
// ==========================================

// System version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// System name
pub const APP_NAME: &str = "Delivery Route Back Office";
