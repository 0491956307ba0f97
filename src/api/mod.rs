// ==========================================
// Delivery Route Back Office - API layer
// ==========================================
// Role: application services over repositories and engines
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod order_api;
pub mod route_api;

// Re-export core types
pub use catalog_api::{CatalogApi, FamilySummary};
pub use error::{ApiError, ApiResult};
pub use order_api::{OrderApi, OrderDetail, OrderItemDetail, OrderListParams, OrderSummary};
pub use route_api::{RouteApi, RouteDetail, RouteStop};
