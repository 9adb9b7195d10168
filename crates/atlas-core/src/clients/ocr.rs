//! Text recognition engine interface and the demo engine

use async_trait::async_trait;
use crate::clients::image_input::ImageInput;
use crate::error::{AtlasError, Result};
use crate::workflow::progress::ProgressReporter;
use atlas_types::{OcrLanguage, Recognition};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulated processing time of the demo engine
pub const DEMO_OCR_LATENCY: Duration = Duration::from_millis(2000);

/// Progress callbacks the demo engine emits per recognition
const MOCK_PROGRESS_STEPS: u32 = 5;

/// Recognizes text in an image.
///
/// Implementations report engine faults as `AtlasError::RecognitionFailed`
/// and may call `progress` any number of times while working.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(
        &self,
        image: &ImageInput,
        language: OcrLanguage,
        progress: &ProgressReporter,
    ) -> Result<Recognition>;
}

#[async_trait]
impl<T: OcrEngine + ?Sized> OcrEngine for Arc<T> {
    async fn recognize(
        &self,
        image: &ImageInput,
        language: OcrLanguage,
        progress: &ProgressReporter,
    ) -> Result<Recognition> {
        (**self).recognize(image, language, progress).await
    }
}

/// Stand-in engine that cycles through canned recognitions
pub struct MockOcrEngine {
    fixtures: Vec<Recognition>,
    next: AtomicUsize,
    latency: Duration,
}

impl MockOcrEngine {
    pub fn new(fixtures: Vec<Recognition>) -> Self {
        Self {
            fixtures,
            next: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// The four printed demo labels
    pub fn demo() -> Self {
        Self::new(vec![
            recognition("///filled.count.soap", 0.95),
            recognition("///index.home.raft", 0.89),
            recognition("///daring.lion.race", 0.92),
            recognition("///table.lamp.house", 0.87),
        ])
        .with_latency(DEMO_OCR_LATENCY)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of recognitions served so far
    pub fn calls(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

fn recognition(text: &str, confidence: f32) -> Recognition {
    Recognition {
        text: text.to_string(),
        confidence,
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn recognize(
        &self,
        image: &ImageInput,
        language: OcrLanguage,
        progress: &ProgressReporter,
    ) -> Result<Recognition> {
        log::debug!(
            "Mock recognition of {} byte {} image ({})",
            image.len(),
            image.mime_type(),
            language
        );

        if self.fixtures.is_empty() {
            return Err(AtlasError::RecognitionFailed("mock engine has no fixtures".to_string()));
        }

        let step = self.latency / MOCK_PROGRESS_STEPS;
        for i in 1..=MOCK_PROGRESS_STEPS {
            tokio::time::sleep(step).await;
            progress.report((i * 100 / MOCK_PROGRESS_STEPS) as u8);
        }

        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.fixtures.len();
        Ok(self.fixtures[index].clone())
    }
}
