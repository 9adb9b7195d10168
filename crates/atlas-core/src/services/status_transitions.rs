//! Delivery status state machine
//!
//! pending -> in-transit -> delivered. Every other edge, including asking
//! for the status a delivery already has, is rejected.

use crate::error::{AtlasError, Result};
use atlas_types::{Delivery, DeliveryStatus};

/// Whether `from -> to` is one of the two forward edges
pub fn is_allowed(from: DeliveryStatus, to: DeliveryStatus) -> bool {
    from.next() == Some(to)
}

/// Move the delivery to `next`, or leave it untouched and return
/// `InvalidTransition`
pub fn advance(delivery: &mut Delivery, next: DeliveryStatus) -> Result<DeliveryStatus> {
    let current = delivery.status;

    if !is_allowed(current, next) {
        log::warn!(
            "Rejected status change for delivery {}: {} -> {}",
            delivery.id, current, next
        );
        return Err(AtlasError::InvalidTransition {
            id: delivery.id.clone(),
            from: current,
            to: next,
        });
    }

    delivery.status = next;
    log::info!("Delivery {} is now {}", delivery.id, next);
    Ok(next)
}
