// ==========================================
// Delivery Route Back Office - geodesic helpers
// ==========================================
// Role: great-circle distance between drop points
// Hard rule: stateless, no side effects, no I/O
// ==========================================

use crate::domain::types::GeoPoint;

/// Mean Earth radius in kilometers (spherical model)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers
///
/// Haversine formula over a spherical Earth:
///   a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)
///   c = 2·asin(√a)
///   d = EARTH_RADIUS_KM · c
///
/// Good to a few tenths of a percent at delivery-route scale, which is
/// far below the granularity of the radius presets used for selection.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat_deg.to_radians();
    let lon1 = a.lon_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let lon2 = b.lon_deg.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_KM * c
}
