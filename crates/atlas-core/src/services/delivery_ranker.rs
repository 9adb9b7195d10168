//! Delivery ranking by distance, duration or creation time

use super::distance::haversine_km;
use atlas_types::{Delivery, GeoCoordinate, SortKey};
use std::cmp::Ordering;

/// Return the deliveries ordered ascending by `key`.
///
/// The input is left untouched. The sort is stable, so deliveries with
/// equal keys keep their relative input order. A missing duration counts
/// as zero minutes.
pub fn rank(deliveries: &[Delivery], key: SortKey, anchor: GeoCoordinate) -> Vec<Delivery> {
    let mut ranked = deliveries.to_vec();

    match key {
        SortKey::Distance => {
            // Compute each distance once; the comparator only reads the cache
            let mut keyed: Vec<(f64, Delivery)> = ranked
                .into_iter()
                .map(|d| (haversine_km(anchor, d.coordinate), d))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
            ranked = keyed.into_iter().map(|(_, d)| d).collect();
        }
        SortKey::Duration => ranked.sort_by_key(|d| d.estimated_minutes.unwrap_or(0)),
        SortKey::CreatedAt => ranked.sort_by_key(|d| d.created_at),
    }

    ranked
}

/// Comparator used by `rank`, exposed for callers sorting in place
pub fn compare(a: &Delivery, b: &Delivery, key: SortKey, anchor: GeoCoordinate) -> Ordering {
    match key {
        SortKey::Distance => haversine_km(anchor, a.coordinate).total_cmp(&haversine_km(anchor, b.coordinate)),
        SortKey::Duration => a.estimated_minutes.unwrap_or(0).cmp(&b.estimated_minutes.unwrap_or(0)),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}
