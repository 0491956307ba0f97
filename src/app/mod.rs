// ==========================================
// Delivery Route Back Office - app layer
// ==========================================
// Role: state wiring for front ends and the CLI entry point
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
