//! Shared types for the delivery scanning system

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical prefix of a three-word address
pub const ADDRESS_PREFIX: &str = "///";

/// Number of words in a three-word address
pub const ADDRESS_WORD_COUNT: usize = 3;

/// Minimum number of alphabetic characters per address word
pub const MIN_WORD_LEN: usize = 2;

/// Errors raised when parsing shared types from text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Unknown delivery status: {0}")]
    UnknownStatus(String),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Unknown OCR language: {0}")]
    UnknownLanguage(String),
}

/// A normalized three-word address such as `///filled.count.soap`.
///
/// Always prefixed, lower-cased, exactly three words of at least two
/// alphabetic characters each. `parse` is the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CandidateAddress(String);

impl CandidateAddress {
    /// Validate and normalize a raw token, with or without the `///` prefix
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let invalid = |reason: String| ParseError::InvalidAddress {
            input: raw.to_string(),
            reason,
        };

        let body = raw.trim().trim_start_matches('/').trim().to_lowercase();
        let words: Vec<&str> = body.split('.').collect();

        if words.len() != ADDRESS_WORD_COUNT {
            return Err(invalid(format!(
                "expected {} words, found {}",
                ADDRESS_WORD_COUNT,
                words.len()
            )));
        }

        for word in &words {
            if word.chars().count() < MIN_WORD_LEN {
                return Err(invalid(format!("word '{}' is too short", word)));
            }
            if !word.chars().all(char::is_alphabetic) {
                return Err(invalid(format!("word '{}' is not alphabetic", word)));
            }
        }

        Ok(Self(format!("{}{}", ADDRESS_PREFIX, words.join("."))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three words without prefix
    pub fn words(&self) -> Vec<&str> {
        self.0[ADDRESS_PREFIX.len()..].split('.').collect()
    }
}

impl FromStr for CandidateAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CandidateAddress {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CandidateAddress> for String {
    fn from(address: CandidateAddress) -> Self {
        address.0
    }
}

impl fmt::Display for CandidateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl GeoCoordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_within_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Text recognition language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OcrLanguage {
    #[default]
    #[serde(rename = "eng")]
    English,
    /// Mongolian Cyrillic
    #[serde(rename = "mon")]
    Mongolian,
    #[serde(rename = "eng+mon")]
    EnglishMongolian,
}

impl OcrLanguage {
    /// Language code handed to the recognition engine
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Mongolian => "mon",
            Self::EnglishMongolian => "eng+mon",
        }
    }
}

impl FromStr for OcrLanguage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eng" | "en" | "english" => Ok(Self::English),
            "mon" | "mn" | "mongolian" => Ok(Self::Mongolian),
            "eng+mon" | "both" | "combined" => Ok(Self::EnglishMongolian),
            other => Err(ParseError::UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for OcrLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw output of the recognition engine for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    /// 0.0 ..= 1.0
    pub confidence: f32,
}

/// Delivery lifecycle: pending -> in-transit -> delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 3] = [Self::Pending, Self::InTransit, Self::Delivered];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in-transit",
            Self::Delivered => "delivered",
        }
    }

    /// The only status this one may advance to
    pub fn next(&self) -> Option<DeliveryStatus> {
        match self {
            Self::Pending => Some(Self::InTransit),
            Self::InTransit => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl FromStr for DeliveryStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-transit" | "in_transit" | "intransit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking key for the delivery list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Distance,
    #[serde(alias = "time")]
    Duration,
    #[serde(alias = "added")]
    CreatedAt,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::CreatedAt => "created-at",
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" => Ok(Self::Distance),
            "duration" | "time" => Ok(Self::Duration),
            "created-at" | "created_at" | "createdat" | "added" => Ok(Self::CreatedAt),
            other => Err(ParseError::UnknownSortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-assigned delivery identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(String);

impl DeliveryId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for DeliveryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeliveryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivery in the session's list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub address: CandidateAddress,
    pub coordinate: GeoCoordinate,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    /// Estimated duration in minutes
    pub estimated_minutes: Option<u32>,
}

/// Result of a successful scan, awaiting operator acceptance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub address: CandidateAddress,
    pub coordinate: GeoCoordinate,
    pub confidence: f32,
    pub raw_text: String,
}

/// Emitted when the operator accepts a scan result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeliveryEvent {
    pub id: DeliveryId,
    pub address: CandidateAddress,
    pub coordinate: GeoCoordinate,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl NewDeliveryEvent {
    /// Build the event for an accepted scan
    pub fn from_scan(result: &ScanResult) -> Self {
        Self {
            id: DeliveryId::new(),
            address: result.address.clone(),
            coordinate: result.coordinate,
            status: DeliveryStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn into_delivery(self, estimated_minutes: Option<u32>) -> Delivery {
        Delivery {
            id: self.id,
            address: self.address,
            coordinate: self.coordinate,
            status: self.status,
            created_at: self.created_at,
            estimated_minutes,
        }
    }
}

/// Number of deliveries per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub pending: usize,
    pub in_transit: usize,
    pub delivered: usize,
}

impl StatusSummary {
    pub fn record(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Pending => self.pending += 1,
            DeliveryStatus::InTransit => self.in_transit += 1,
            DeliveryStatus::Delivered => self.delivered += 1,
        }
    }

    pub fn get(&self, status: DeliveryStatus) -> usize {
        match status {
            DeliveryStatus::Pending => self.pending,
            DeliveryStatus::InTransit => self.in_transit,
            DeliveryStatus::Delivered => self.delivered,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_transit + self.delivered
    }
}
