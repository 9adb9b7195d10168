//! Session-scoped delivery list
//!
//! The list is the single owner of delivery records. Scans reach it as
//! `NewDeliveryEvent`s over an mpsc channel, so all mutations happen in
//! one place and in arrival order.

use crate::config::AtlasConfig;
use crate::constants::DELIVERY_CHANNEL_CAPACITY;
use crate::error::{AtlasError, Result};
use crate::services::{delivery_ranker, distance, status_transitions};
use atlas_types::{
    CandidateAddress, Delivery, DeliveryId, DeliveryStatus, GeoCoordinate, NewDeliveryEvent,
    SortKey, StatusSummary,
};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;

/// Channel carrying accepted scans to the list owner
pub fn delivery_channel() -> (mpsc::Sender<NewDeliveryEvent>, mpsc::Receiver<NewDeliveryEvent>) {
    mpsc::channel(DELIVERY_CHANNEL_CAPACITY)
}

/// How a new delivery gets its estimated duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationEstimator {
    Fixed(u32),
    /// Uniform in `min..max` minutes
    Random { min: u32, max: u32 },
}

impl DurationEstimator {
    pub fn from_config(config: &AtlasConfig) -> Self {
        Self::Random {
            min: config.deliveries.min_estimate_minutes,
            max: config.deliveries.max_estimate_minutes,
        }
    }

    pub fn estimate(&self) -> u32 {
        match *self {
            Self::Fixed(minutes) => minutes,
            Self::Random { min, max } if min < max => rand::thread_rng().gen_range(min..max),
            Self::Random { min, .. } => min,
        }
    }
}

pub struct DeliveryList {
    deliveries: Vec<Delivery>,
    base_location: GeoCoordinate,
    estimator: DurationEstimator,
}

impl DeliveryList {
    pub fn new(base_location: GeoCoordinate, estimator: DurationEstimator) -> Self {
        Self {
            deliveries: Vec::new(),
            base_location,
            estimator,
        }
    }

    pub fn from_config(config: &AtlasConfig) -> Self {
        Self::new(config.base_location(), DurationEstimator::from_config(config))
    }

    pub fn base_location(&self) -> GeoCoordinate {
        self.base_location
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Deliveries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter()
    }

    pub fn get(&self, id: &DeliveryId) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| &d.id == id)
    }

    /// Add an accepted scan, assigning its estimated duration
    pub fn add(&mut self, event: NewDeliveryEvent) -> Result<&Delivery> {
        let minutes = self.estimator.estimate();
        self.insert(event.into_delivery(Some(minutes)))?;

        let added = &self.deliveries[self.deliveries.len() - 1];
        info!(
            "Delivery {} added: {} at {} (~{} min)",
            added.id, added.address, added.coordinate, minutes
        );
        Ok(added)
    }

    /// Add a complete record as-is
    pub fn insert(&mut self, delivery: Delivery) -> Result<()> {
        if self.get(&delivery.id).is_some() {
            return Err(AtlasError::DuplicateDelivery(delivery.id));
        }
        self.deliveries.push(delivery);
        Ok(())
    }

    pub fn advance(&mut self, id: &DeliveryId, next: DeliveryStatus) -> Result<DeliveryStatus> {
        let delivery = self
            .deliveries
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| AtlasError::NotFound(format!("delivery {}", id)))?;

        status_transitions::advance(delivery, next)
    }

    /// Display order for `key`, measured from the base location
    pub fn ranked(&self, key: SortKey) -> Vec<Delivery> {
        delivery_ranker::rank(&self.deliveries, key, self.base_location)
    }

    pub fn distance_km(&self, delivery: &Delivery) -> f64 {
        distance::haversine_km(self.base_location, delivery.coordinate)
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for delivery in &self.deliveries {
            summary.record(delivery.status);
        }
        summary
    }

    /// Take every event already queued without waiting; returns how many
    /// were added
    pub fn receive_pending(&mut self, rx: &mut mpsc::Receiver<NewDeliveryEvent>) -> usize {
        let mut added = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    if self.accept_event(event) {
                        added += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        added
    }

    /// Consume events until every sender is gone or `cancel` fires
    pub async fn run(
        &mut self,
        rx: &mut mpsc::Receiver<NewDeliveryEvent>,
        cancel: &CancellationToken,
    ) -> usize {
        let mut added = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Delivery list listener cancelled");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => {
                        if self.accept_event(event) {
                            added += 1;
                        }
                    }
                    None => {
                        debug!("Delivery channel closed");
                        break;
                    }
                },
            }
        }
        added
    }

    fn accept_event(&mut self, event: NewDeliveryEvent) -> bool {
        match self.add(event) {
            Ok(_) => true,
            Err(e) => {
                warn!("Ignoring delivery event: {}", e);
                false
            }
        }
    }
}

/// The demo deliveries a fresh session starts with
pub fn sample_deliveries(now: DateTime<Utc>) -> Vec<Delivery> {
    let mut samples = Vec::new();

    for (id, address, lat, lng, status, age, minutes) in [
        ("1", "///index.home.raft", 51.508112, -0.075949, DeliveryStatus::Pending, Duration::hours(1), 25),
        ("2", "///daring.lion.race", 51.495326, -0.191406, DeliveryStatus::InTransit, Duration::hours(2), 35),
    ] {
        if let Ok(address) = CandidateAddress::parse(address) {
            samples.push(Delivery {
                id: DeliveryId::from(id),
                address,
                coordinate: GeoCoordinate::new(lat, lng),
                status,
                created_at: now - age,
                estimated_minutes: Some(minutes),
            });
        }
    }

    samples
}
