// ==========================================
// Delivery Route Back Office - engine layer
// ==========================================
// Role: selection rules for route assembly
// Hard rule: engines read through repositories and return values;
//            they never write to storage
// ==========================================

pub mod geo;
pub mod proximity;

// Re-export core engine types
pub use geo::{haversine_km, EARTH_RADIUS_KM};
pub use proximity::{AlwaysCompatible, FamilyCompatibility, ProximityEngine, RadiusSelection};

// TODO: family compatibility rule table (restriction pairs), once the
// business side settles which families must not share a vehicle
