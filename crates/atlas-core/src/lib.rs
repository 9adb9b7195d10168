//! Address Atlas Core Library
//!
//! Three-word address extraction from recognized label text, the scan
//! workflow around the recognition engine and geocoder, and the session's
//! delivery list with its ranking and status rules.

pub mod config;
pub mod constants;
pub mod clients;
pub mod services;
pub mod workflow;
pub mod error;

// Re-export main types for easy access
pub use config::AtlasConfig;
pub use error::{AtlasError, Result};

// Re-export all client types
pub use clients::{
    Geocoder,
    ImageInput,
    MockOcrEngine,
    OcrEngine,
    StaticGeocoder,
};

// Re-export service types
pub use services::{
    AddressExtractor,
    format_distance_km,
    haversine_km,
};

// Re-export workflow types
pub use workflow::{
    DeliveryList,
    DurationEstimator,
    ProgressReporter,
    ScanSettings,
    ScanWorkflow,
    delivery_channel,
    sample_deliveries,
};

pub use atlas_types as types;
