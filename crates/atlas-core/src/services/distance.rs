//! Great-circle distance between coordinates

use crate::constants::EARTH_RADIUS_KM;
use atlas_types::GeoCoordinate;
use std::f64::consts::PI;

/// Haversine distance in kilometres on a sphere of radius 6371 km.
///
/// Ranking and the distance label both go through this function so the
/// order and the displayed value always agree.
pub fn haversine_km(from: GeoCoordinate, to: GeoCoordinate) -> f64 {
    let d_lat = (to.lat - from.lat) * PI / 180.0;
    let d_lng = (to.lng - from.lng) * PI / 180.0;
    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + (from.lat * PI / 180.0).cos() * (to.lat * PI / 180.0).cos()
            * (d_lng / 2.0).sin() * (d_lng / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Distance label shown next to a delivery, e.g. `3.4 km`
pub fn format_distance_km(distance_km: f64) -> String {
    format!("{:.1} km", distance_km)
}
