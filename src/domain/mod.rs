// ==========================================
// Delivery Route Back Office - domain layer
// ==========================================
// Role: entities, value types, lifecycle rules
// Hard rule: no data access, no selection logic
// ==========================================

pub mod catalog;
pub mod order;
pub mod route;
pub mod types;

// Re-export core types
pub use catalog::{Family, NewFamily, NewProduct, Product};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use route::{NewRoute, Route, RouteOrder, RouteTrackPoint};
pub use types::{GeoPoint, RouteStatus};
