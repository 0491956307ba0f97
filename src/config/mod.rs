// ==========================================
// Delivery Route Back Office - config layer
// ==========================================
// Role: system configuration over the config_kv table
// ==========================================

pub mod config_manager;
pub mod listing_config_trait;

pub use config_manager::ConfigManager;
pub use listing_config_trait::ListingConfigReader;
