//! Collaborator interfaces: recognition engine, geocoder and image input

pub mod geocoder;
pub mod image_input;
pub mod ocr;

// Re-export all client types
pub use geocoder::{Geocoder, StaticGeocoder};
pub use image_input::ImageInput;
pub use ocr::{MockOcrEngine, OcrEngine};
