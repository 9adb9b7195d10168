/// Scanning and ranking constants

use atlas_types::GeoCoordinate;

/// Mean Earth radius in kilometres used by the haversine distance
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default ranking anchor (central London)
pub const DEFAULT_BASE_LOCATION: GeoCoordinate = GeoCoordinate::new(51.5074, -0.1278);

/// Characters of raw recognized text shown when no address was found
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Bounded wait on a single recognition attempt
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

/// Extra recognition attempts after a retryable failure
pub const DEFAULT_OCR_MAX_RETRIES: u32 = 2;

/// First backoff delay, doubled after every failed attempt
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Estimated delivery duration range in minutes (upper bound exclusive)
pub const DEFAULT_MIN_ESTIMATE_MINUTES: u32 = 15;
pub const DEFAULT_MAX_ESTIMATE_MINUTES: u32 = 60;

/// Spread of the fallback coordinate for unknown addresses
pub const DEFAULT_GEOCODER_JITTER_DEGREES: f64 = 0.01;

/// Largest accepted fallback spread
pub const MAX_GEOCODER_JITTER_DEGREES: f64 = 1.0;

/// Capacity of the new-delivery channel
pub const DELIVERY_CHANNEL_CAPACITY: usize = 32;
