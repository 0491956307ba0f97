// ==========================================
// Delivery Route Back Office - proximity selection engine
// ==========================================
// Role: narrow a candidate pool of orders to those within a radius of a
//       reference order, for route assembly
// Input: reference order id + radius (raw listing parameters) + pool
// Output: surviving order ids, or a passthrough marker
// Hard rule: read-only over the repository; never mutates the pool
// ==========================================

use crate::domain::order::Order;
use crate::engine::geo::haversine_km;
use crate::repository::order_repo::OrderRepository;
use crate::repository::RepositoryResult;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

// ==========================================
// Family compatibility seam
// ==========================================

/// Decides whether a candidate order may share a route with the reference
/// order, based on the product families each order carries.
///
/// The engine computes both family-id sets and consults this predicate for
/// every candidate; the default implementation accepts everything. A
/// restriction table (e.g. frozen goods never ride with chemicals) can be
/// plugged in without touching the selection contract.
pub trait FamilyCompatibility: Send + Sync {
    fn compatible(
        &self,
        reference_families: &HashSet<i64>,
        candidate_families: &HashSet<i64>,
    ) -> bool;
}

/// Default predicate: any family combination may share a route.
pub struct AlwaysCompatible;

impl FamilyCompatibility for AlwaysCompatible {
    fn compatible(&self, _reference: &HashSet<i64>, _candidate: &HashSet<i64>) -> bool {
        true
    }
}

// ==========================================
// Selection outcome
// ==========================================

/// Outcome of applying the radius parameters to a candidate pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadiusSelection {
    /// No filtering applied; the caller keeps the pool as-is.
    Passthrough,
    /// The surviving order ids (set semantics; the reference order id is
    /// always a member when the reference resolved).
    Selected(Vec<i64>),
}

// ==========================================
// ProximityEngine
// ==========================================
// Hard rule: does not write to storage; no caching across invocations
pub struct ProximityEngine {
    order_repo: Arc<OrderRepository>,
    compatibility: Arc<dyn FamilyCompatibility>,
}

impl ProximityEngine {
    /// Engine with the default always-compatible family predicate
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self::with_compatibility(order_repo, Arc::new(AlwaysCompatible))
    }

    pub fn with_compatibility(
        order_repo: Arc<OrderRepository>,
        compatibility: Arc<dyn FamilyCompatibility>,
    ) -> Self {
        Self {
            order_repo,
            compatibility,
        }
    }

    /// Resolve the raw listing parameters and filter the pool.
    ///
    /// The two failure families are deliberately asymmetric, matching the
    /// observable behavior of the listing contract:
    /// - either parameter ABSENT: the filter does not run at all and the
    ///   pool passes through unchanged;
    /// - a parameter PRESENT but non-numeric (or a reference order that
    ///   does not exist): the selection is empty.
    /// Do not unify these paths.
    pub fn apply(
        &self,
        reference_order_id: Option<&str>,
        radius_km: Option<&str>,
        pool: &[Order],
    ) -> RepositoryResult<RadiusSelection> {
        let (Some(raw_id), Some(raw_radius)) = (reference_order_id, radius_km) else {
            return Ok(RadiusSelection::Passthrough);
        };

        let Ok(id) = raw_id.trim().parse::<i64>() else {
            debug!(raw_id, "reference order id is not numeric; selecting nothing");
            return Ok(RadiusSelection::Selected(Vec::new()));
        };
        let Ok(radius) = raw_radius.trim().parse::<f64>() else {
            debug!(raw_radius, "radius is not numeric; selecting nothing");
            return Ok(RadiusSelection::Selected(Vec::new()));
        };
        if !radius.is_finite() {
            debug!(raw_radius, "radius is not finite; selecting nothing");
            return Ok(RadiusSelection::Selected(Vec::new()));
        }

        self.select_within_radius(id, radius, pool)
    }

    /// Keep the candidates within `radius_km` of the reference order.
    ///
    /// The reference order is resolved through the repository and is always
    /// part of the result, whether or not it appears in the pool. Family-id
    /// sets for the reference and the whole pool are loaded in one batched
    /// read before the loop.
    ///
    /// # Returns
    /// - Selected(ids): surviving candidates plus the reference id
    /// - Selected([]): the reference order does not exist
    #[instrument(skip(self, pool), fields(pool_size = pool.len()))]
    pub fn select_within_radius(
        &self,
        reference_order_id: i64,
        radius_km: f64,
        pool: &[Order],
    ) -> RepositoryResult<RadiusSelection> {
        let Some(reference) = self.order_repo.find_by_id(reference_order_id)? else {
            debug!(reference_order_id, "reference order not found; selecting nothing");
            return Ok(RadiusSelection::Selected(Vec::new()));
        };

        let Some(reference_position) = reference.position() else {
            // Without a reference position no candidate distance is
            // computable; only the reference itself survives.
            warn!(
                reference_order_id,
                "reference order has no coordinates; selection degenerates to the reference"
            );
            return Ok(RadiusSelection::Selected(vec![reference_order_id]));
        };

        let mut ids: Vec<i64> = pool.iter().map(|order| order.id).collect();
        ids.push(reference_order_id);
        let families_by_order = self.order_repo.family_ids_by_order(&ids)?;

        let empty_families = HashSet::new();
        let reference_families = families_by_order
            .get(&reference_order_id)
            .unwrap_or(&empty_families);

        let mut selected = Vec::with_capacity(pool.len() + 1);
        let mut missing_coordinates = 0usize;

        for candidate in pool {
            // The reference is appended unconditionally after the loop
            if candidate.id == reference_order_id {
                continue;
            }

            let candidate_families = families_by_order
                .get(&candidate.id)
                .unwrap_or(&empty_families);
            if !self
                .compatibility
                .compatible(reference_families, candidate_families)
            {
                debug!(candidate_id = candidate.id, "candidate rejected by family compatibility");
                continue;
            }

            let Some(candidate_position) = candidate.position() else {
                missing_coordinates += 1;
                continue;
            };

            let distance_km = haversine_km(reference_position, candidate_position);
            if distance_km <= radius_km {
                selected.push(candidate.id);
            }
        }

        if missing_coordinates > 0 {
            warn!(
                missing_coordinates,
                "candidates without coordinates excluded from radius selection"
            );
        }

        // The reference order always belongs to the selection
        selected.push(reference_order_id);

        Ok(RadiusSelection::Selected(selected))
    }
}
