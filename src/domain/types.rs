// ==========================================
// Delivery Route Back Office - domain types
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Route status
// ==========================================
// Serialized as SCREAMING_SNAKE_CASE (matches the database column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Planned,    // assembled, not yet dispatched
    InProgress, // vehicle on the road
    Completed,  // all stops done
}

impl RouteStatus {
    /// Database / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Planned => "PLANNED",
            RouteStatus::InProgress => "IN_PROGRESS",
            RouteStatus::Completed => "COMPLETED",
        }
    }

    /// Parse the database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLANNED" => Some(RouteStatus::Planned),
            "IN_PROGRESS" => Some(RouteStatus::InProgress),
            "COMPLETED" => Some(RouteStatus::Completed),
            _ => None,
        }
    }

    /// Legal lifecycle transitions: PLANNED -> IN_PROGRESS -> COMPLETED
    pub fn can_transition_to(&self, next: RouteStatus) -> bool {
        matches!(
            (self, next),
            (RouteStatus::Planned, RouteStatus::InProgress)
                | (RouteStatus::InProgress, RouteStatus::Completed)
        )
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Geographic point
// ==========================================
// WGS84 decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}
