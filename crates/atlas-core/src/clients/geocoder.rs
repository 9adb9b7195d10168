//! Address to coordinate resolution

use async_trait::async_trait;
use crate::constants::MAX_GEOCODER_JITTER_DEGREES;
use atlas_types::{CandidateAddress, GeoCoordinate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Resolves a three-word address to a coordinate. Total: never fails.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &CandidateAddress) -> GeoCoordinate;
}

#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    async fn resolve(&self, address: &CandidateAddress) -> GeoCoordinate {
        (**self).resolve(address).await
    }
}

/// Fixed lookup table; unknown addresses land near the anchor
pub struct StaticGeocoder {
    table: HashMap<CandidateAddress, GeoCoordinate>,
    anchor: GeoCoordinate,
    jitter_degrees: f64,
    rng: Mutex<StdRng>,
}

impl StaticGeocoder {
    pub fn new(anchor: GeoCoordinate, jitter_degrees: f64) -> Self {
        Self {
            table: HashMap::new(),
            anchor,
            jitter_degrees,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Table pre-filled with the printed demo labels
    pub fn demo(anchor: GeoCoordinate, jitter_degrees: f64) -> Self {
        let mut geocoder = Self::new(anchor, jitter_degrees);
        for (address, lat, lng) in [
            ("///filled.count.soap", 51.521251, -0.203586),
            ("///index.home.raft", 51.508112, -0.075949),
            ("///daring.lion.race", 51.495326, -0.191406),
            ("///table.lamp.house", 51.515419, -0.141204),
        ] {
            if let Ok(address) = CandidateAddress::parse(address) {
                geocoder.insert(address, GeoCoordinate::new(lat, lng));
            }
        }
        geocoder
    }

    /// Reproducible fallback coordinates
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn insert(&mut self, address: CandidateAddress, coordinate: GeoCoordinate) {
        self.table.insert(address, coordinate);
    }

    pub fn lookup(&self, address: &CandidateAddress) -> Option<GeoCoordinate> {
        self.table.get(address).copied()
    }

    /// Anchor moved by up to the jitter in each axis, kept within WGS84
    /// bounds. The spread is capped so `resolve` cannot fail.
    fn jittered_anchor(&self) -> GeoCoordinate {
        if self.jitter_degrees.is_nan() || self.jitter_degrees <= 0.0 {
            return self.anchor;
        }

        let spread = self.jitter_degrees.min(MAX_GEOCODER_JITTER_DEGREES);
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        GeoCoordinate::new(
            (self.anchor.lat + rng.gen_range(-spread..=spread)).clamp(-90.0, 90.0),
            (self.anchor.lng + rng.gen_range(-spread..=spread)).clamp(-180.0, 180.0),
        )
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, address: &CandidateAddress) -> GeoCoordinate {
        match self.lookup(address) {
            Some(coordinate) => coordinate,
            None => {
                let coordinate = self.jittered_anchor();
                log::info!("Unknown address {}, using approximate coordinate {}", address, coordinate);
                coordinate
            }
        }
    }
}
