//! Configuration management for the Address Atlas system

use serde::{Deserialize, Serialize};
use crate::constants::*;
use crate::error::{AtlasError, Result};
use atlas_types::{GeoCoordinate, OcrLanguage, SortKey};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure; every section is optional in the file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AtlasConfig {
    #[serde(default)]
    pub base_location: BaseLocationConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub deliveries: DeliveriesConfig,

    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseLocationConfig {
    #[serde(alias = "latitude")]
    pub lat: f64,

    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl Default for BaseLocationConfig {
    fn default() -> Self {
        Self {
            lat: DEFAULT_BASE_LOCATION.lat,
            lng: DEFAULT_BASE_LOCATION.lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default)]
    pub language: OcrLanguage,

    #[serde(alias = "timeout", default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_ocr_max_retries")]
    pub max_retries: u32,

    #[serde(alias = "backoff_ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: OcrLanguage::default(),
            timeout_secs: default_ocr_timeout_secs(),
            max_retries: default_ocr_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveriesConfig {
    #[serde(default = "default_min_estimate_minutes")]
    pub min_estimate_minutes: u32,

    #[serde(default = "default_max_estimate_minutes")]
    pub max_estimate_minutes: u32,

    #[serde(alias = "sort_by", default)]
    pub default_sort: SortKey,
}

impl Default for DeliveriesConfig {
    fn default() -> Self {
        Self {
            min_estimate_minutes: default_min_estimate_minutes(),
            max_estimate_minutes: default_max_estimate_minutes(),
            default_sort: SortKey::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_jitter_degrees")]
    pub jitter_degrees: f64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            jitter_degrees: default_jitter_degrees(),
        }
    }
}

// Default functions
fn default_ocr_timeout_secs() -> u64 {
    DEFAULT_OCR_TIMEOUT_SECS
}

fn default_ocr_max_retries() -> u32 {
    DEFAULT_OCR_MAX_RETRIES
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

fn default_min_estimate_minutes() -> u32 {
    DEFAULT_MIN_ESTIMATE_MINUTES
}

fn default_max_estimate_minutes() -> u32 {
    DEFAULT_MAX_ESTIMATE_MINUTES
}

fn default_jitter_degrees() -> f64 {
    DEFAULT_GEOCODER_JITTER_DEGREES
}

impl AtlasConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AtlasError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AtlasError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Ranking anchor for the session
    pub fn base_location(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.base_location.lat, self.base_location.lng)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.ocr.retry_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.base_location().is_within_bounds() {
            return Err(AtlasError::Config(format!(
                "Base location {} is out of range (lat -90..90, lng -180..180) and is required to be valid",
                self.base_location()
            )));
        }

        if self.ocr.timeout_secs == 0 {
            return Err(AtlasError::Config("OCR timeout is required to be at least 1 second".to_string()));
        }

        if self.extraction.preview_chars == 0 {
            return Err(AtlasError::Config("Preview length is required to be non-zero".to_string()));
        }

        if self.deliveries.min_estimate_minutes >= self.deliveries.max_estimate_minutes {
            return Err(AtlasError::Config(format!(
                "Estimate range {}..{} is empty; min is required to be below max",
                self.deliveries.min_estimate_minutes, self.deliveries.max_estimate_minutes
            )));
        }

        let jitter = self.geocoder.jitter_degrees;
        if !jitter.is_finite() || !(0.0..=MAX_GEOCODER_JITTER_DEGREES).contains(&jitter) {
            return Err(AtlasError::Config(format!(
                "Geocoder jitter {} is required to be within 0..={} degrees",
                jitter, MAX_GEOCODER_JITTER_DEGREES
            )));
        }

        Ok(())
    }
}
