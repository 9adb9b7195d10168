//! Service modules for address extraction and delivery ranking

pub mod address_extractor;
pub mod delivery_ranker;
pub mod distance;
pub mod status_transitions;

// Re-export service types
pub use address_extractor::AddressExtractor;
pub use delivery_ranker::rank;
pub use distance::{format_distance_km, haversine_km};
pub use status_transitions::advance;
