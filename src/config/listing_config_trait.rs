// ==========================================
// Delivery Route Back Office - listing config trait
// ==========================================
// Role: configuration read interface for the listing services
// Hard rule: read-only; no configuration writes, no business logic
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ListingConfigReader trait
// ==========================================
// Implementor: ConfigManager (reads the config_kv table)
#[async_trait]
pub trait ListingConfigReader: Send + Sync {
    /// Page size applied when the caller does not ask for one
    ///
    /// # Default
    /// - 50
    async fn get_default_page_size(&self) -> Result<i64, Box<dyn Error>>;

    /// Upper bound for caller-requested page sizes
    ///
    /// # Default
    /// - 200
    async fn get_max_page_size(&self) -> Result<i64, Box<dyn Error>>;

    /// Advisory radius ceiling surfaced to selection UIs (km)
    ///
    /// The engine itself honours any positive radius; this value only
    /// bounds what front ends offer.
    ///
    /// # Default
    /// - 100.0
    async fn get_max_radius_km(&self) -> Result<f64, Box<dyn Error>>;
}
