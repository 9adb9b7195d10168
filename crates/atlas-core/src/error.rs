//! Error types for the Address Atlas system

use atlas_types::{DeliveryId, DeliveryStatus, ParseError};
use std::time::Duration;
use thiserror::Error;

/// Main error type for all Address Atlas operations
#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Input rejected: {0}")]
    InputRejected(String),

    #[error("No address found in recognized text: {preview}")]
    NoAddressFound { preview: String },

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Recognition timed out after {0:?}")]
    RecognitionTimeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid status transition for delivery {id}: {from} -> {to}")]
    InvalidTransition {
        id: DeliveryId,
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Duplicate delivery: {0}")]
    DuplicateDelivery(DeliveryId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery channel closed")]
    ChannelClosed,

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl AtlasError {
    /// Faults of the recognition engine that may succeed when tried again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RecognitionFailed(_) | Self::RecognitionTimeout(_))
    }

    /// Problems with what the operator supplied; retrying the same input won't help
    pub fn is_caller_input(&self) -> bool {
        matches!(self, Self::InputRejected(_) | Self::NoAddressFound { .. })
    }

    /// Short notification text for the operator
    pub fn operator_message(&self) -> String {
        match self {
            Self::InputRejected(_) => "Please select an image file".to_string(),
            Self::NoAddressFound { preview } => format!(
                "No what3words addresses found in this format: ///word.word.word\nExtracted text: {}",
                preview
            ),
            Self::RecognitionFailed(_) | Self::RecognitionTimeout(_) => {
                "Failed to process image. Please try again.".to_string()
            }
            Self::Cancelled => "Scan cancelled".to_string(),
            Self::InvalidTransition { from, to, .. } => {
                format!("A {} delivery cannot be marked {}", from, to)
            }
            other => other.to_string(),
        }
    }
}

/// Result type for Address Atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(AtlasError::RecognitionFailed("engine crashed".to_string()).is_retryable());
        assert!(AtlasError::RecognitionTimeout(Duration::from_secs(30)).is_retryable());
        assert!(!AtlasError::InputRejected("text/plain".to_string()).is_retryable());
        assert!(!AtlasError::Cancelled.is_retryable());

        assert!(AtlasError::InputRejected("text/plain".to_string()).is_caller_input());
        assert!(AtlasError::NoAddressFound { preview: String::new() }.is_caller_input());
        assert!(!AtlasError::RecognitionFailed("x".to_string()).is_caller_input());
    }

    #[test]
    fn test_operator_messages() {
        let rejected = AtlasError::InputRejected("application/pdf".to_string());
        assert_eq!(rejected.operator_message(), "Please select an image file");

        let missing = AtlasError::NoAddressFound { preview: "hello world".to_string() };
        assert!(missing.operator_message().contains("///word.word.word"));
        assert!(missing.operator_message().contains("hello world"));

        let transition = AtlasError::InvalidTransition {
            id: DeliveryId::from("1"),
            from: DeliveryStatus::Delivered,
            to: DeliveryStatus::Pending,
        };
        assert_eq!(transition.operator_message(), "A delivered delivery cannot be marked pending");
    }
}
