//! Scan workflow: image -> recognized text -> address -> coordinate
//!
//! Recognition is the only step that suspends. It runs under a bounded
//! wait, can be cancelled, and retryable engine faults are retried with
//! exponential backoff. Accepted results leave through a typed channel to
//! the delivery list owner.

use crate::clients::{Geocoder, ImageInput, OcrEngine};
use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::services::address_extractor::{preview, AddressExtractor};
use super::progress::ProgressReporter;
use atlas_types::{NewDeliveryEvent, OcrLanguage, Recognition, ScanResult};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Tunables of a scan
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub language: OcrLanguage,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub preview_chars: usize,
}

impl ScanSettings {
    pub fn from_config(config: &AtlasConfig) -> Self {
        Self {
            language: config.ocr.language,
            timeout: config.ocr_timeout(),
            max_retries: config.ocr.max_retries,
            retry_backoff: config.retry_backoff(),
            preview_chars: config.extraction.preview_chars,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from_config(&AtlasConfig::default())
    }
}

pub struct ScanWorkflow<O: OcrEngine, G: Geocoder> {
    ocr: O,
    geocoder: G,
    extractor: AddressExtractor,
    settings: ScanSettings,
}

impl<O: OcrEngine, G: Geocoder> ScanWorkflow<O, G> {
    pub fn new(ocr: O, geocoder: G, settings: ScanSettings) -> Self {
        Self {
            ocr,
            geocoder,
            extractor: AddressExtractor::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Recognize, extract and resolve the address printed in `image`
    pub async fn scan(
        &self,
        image: &ImageInput,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ScanResult> {
        info!(
            "Scanning {} byte {} image ({})",
            image.len(),
            image.mime_type(),
            self.settings.language
        );

        let recognition = self.recognize_with_retry(image, progress, cancel).await?;
        progress.report(100);

        match self.resolve_text(recognition).await {
            Ok(result) => {
                info!("Address detected: {} ({:.1}% confidence)", result.address, result.confidence * 100.0);
                Ok(result)
            }
            Err(e) => {
                warn!("Scan produced no address: {}", e);
                Err(e)
            }
        }
    }

    /// Resolve text the operator typed in after a failed extraction
    pub async fn scan_text(&self, text: &str) -> Result<ScanResult> {
        self.resolve_text(Recognition {
            text: text.to_string(),
            confidence: 1.0,
        })
        .await
    }

    /// Hand an accepted result to the delivery list owner
    pub async fn accept(
        &self,
        result: &ScanResult,
        sender: &mpsc::Sender<NewDeliveryEvent>,
    ) -> Result<NewDeliveryEvent> {
        let event = NewDeliveryEvent::from_scan(result);
        sender
            .send(event.clone())
            .await
            .map_err(|_| AtlasError::ChannelClosed)?;

        info!("Added {} to delivery list as {}", event.address, event.id);
        Ok(event)
    }

    async fn resolve_text(&self, recognition: Recognition) -> Result<ScanResult> {
        let mut candidates = self.extractor.extract(&recognition.text).into_iter();

        let address = candidates.next().ok_or_else(|| AtlasError::NoAddressFound {
            preview: preview(&recognition.text, self.settings.preview_chars),
        })?;

        let skipped = candidates.count();
        if skipped > 0 {
            debug!("Picked leftmost address {}, ignoring {} other candidates", address, skipped);
        }

        let coordinate = self.geocoder.resolve(&address).await;

        Ok(ScanResult {
            address,
            coordinate,
            confidence: clamp_confidence(recognition.confidence),
            raw_text: recognition.text,
        })
    }

    async fn recognize_with_retry(
        &self,
        image: &ImageInput,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Recognition> {
        let mut backoff = self.settings.retry_backoff;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.recognize_once(image, progress, cancel).await {
                Ok(recognition) => {
                    debug!("Recognition succeeded on attempt {}", attempt);
                    return Ok(recognition);
                }
                Err(e) if e.is_retryable() && attempt <= self.settings.max_retries => {
                    warn!(
                        "Recognition attempt {} failed: {}; retrying in {:?}",
                        attempt, e, backoff
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(AtlasError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => {
                    error!("Recognition failed after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn recognize_once(
        &self,
        image: &ImageInput,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Recognition> {
        let timeout = self.settings.timeout;
        let recognize = self.ocr.recognize(image, self.settings.language, progress);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AtlasError::Cancelled),
            outcome = tokio::time::timeout(timeout, recognize) => match outcome {
                Ok(result) => result,
                Err(_) => Err(AtlasError::RecognitionTimeout(timeout)),
            },
        }
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
