use async_trait::async_trait;
use atlas_core::constants::DEFAULT_BASE_LOCATION;
use atlas_core::types::{CandidateAddress, GeoCoordinate, OcrLanguage, Recognition};
use atlas_core::{
    AtlasError, Geocoder, ImageInput, MockOcrEngine, OcrEngine, ProgressReporter, Result,
    ScanSettings, ScanWorkflow, StaticGeocoder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fails with a retryable fault a fixed number of times, then succeeds
struct FlakyOcr {
    failures_left: AtomicUsize,
    calls: AtomicUsize,
    text: String,
}

impl FlakyOcr {
    fn new(failures: usize, text: &str) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for FlakyOcr {
    async fn recognize(
        &self,
        _image: &ImageInput,
        _language: OcrLanguage,
        progress: &ProgressReporter,
    ) -> Result<Recognition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        progress.report(50);

        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(AtlasError::RecognitionFailed("engine crashed".to_string()));
        }

        Ok(Recognition {
            text: self.text.clone(),
            confidence: 0.9,
        })
    }
}

/// Never finishes on its own
struct HangingOcr {
    calls: AtomicUsize,
}

#[async_trait]
impl OcrEngine for HangingOcr {
    async fn recognize(
        &self,
        _image: &ImageInput,
        _language: OcrLanguage,
        _progress: &ProgressReporter,
    ) -> Result<Recognition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Rejects the input outright
struct RejectingOcr;

#[async_trait]
impl OcrEngine for RejectingOcr {
    async fn recognize(
        &self,
        _image: &ImageInput,
        _language: OcrLanguage,
        _progress: &ProgressReporter,
    ) -> Result<Recognition> {
        Err(AtlasError::InputRejected("unsupported colour space".to_string()))
    }
}

/// Records which language it was asked for
struct LanguageProbe {
    seen: Mutex<Vec<OcrLanguage>>,
}

#[async_trait]
impl OcrEngine for LanguageProbe {
    async fn recognize(
        &self,
        _image: &ImageInput,
        language: OcrLanguage,
        _progress: &ProgressReporter,
    ) -> Result<Recognition> {
        self.seen.lock().unwrap().push(language);
        Ok(Recognition {
            text: "///тэмээ.нохой.морь".to_string(),
            confidence: 0.0,
        })
    }
}

/// Always answers the same coordinate and counts lookups
struct FixedGeocoder {
    coordinate: GeoCoordinate,
    lookups: AtomicUsize,
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn resolve(&self, _address: &CandidateAddress) -> GeoCoordinate {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.coordinate
    }
}

fn png() -> ImageInput {
    ImageInput::from_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec()).unwrap()
}

fn fast_settings() -> ScanSettings {
    ScanSettings {
        language: OcrLanguage::English,
        timeout: Duration::from_millis(100),
        max_retries: 2,
        retry_backoff: Duration::from_millis(5),
        preview_chars: 20,
    }
}

fn demo_geocoder() -> StaticGeocoder {
    StaticGeocoder::demo(DEFAULT_BASE_LOCATION, 0.01).with_seed(1)
}

#[tokio::test]
async fn test_scan_demo_label() {
    let workflow = ScanWorkflow::new(
        MockOcrEngine::demo().with_latency(Duration::ZERO),
        demo_geocoder(),
        fast_settings(),
    );

    let result = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .expect("scan should succeed");

    assert_eq!(result.address.as_str(), "///filled.count.soap");
    assert_eq!(result.coordinate, GeoCoordinate::new(51.521251, -0.203586));
    assert_eq!(result.confidence, 0.95);
    assert_eq!(result.raw_text, "///filled.count.soap");
}

#[tokio::test]
async fn test_scan_picks_leftmost_address_in_noisy_text() {
    let ocr = FlakyOcr::new(0, "DELIVER TO\nDaring.Lion.Race\nor ///table.lamp.house");
    let workflow = ScanWorkflow::new(ocr, demo_geocoder(), fast_settings());

    let result = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.address.as_str(), "///daring.lion.race");
    assert_eq!(result.coordinate, GeoCoordinate::new(51.495326, -0.191406));
}

#[tokio::test]
async fn test_retryable_failure_is_retried() {
    let ocr = Arc::new(FlakyOcr::new(2, "///index.home.raft"));
    let workflow = ScanWorkflow::new(ocr.clone(), demo_geocoder(), fast_settings());

    let result = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .expect("third attempt should succeed");

    assert_eq!(result.address.as_str(), "///index.home.raft");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let ocr = Arc::new(FlakyOcr::new(10, "///index.home.raft"));
    let workflow = ScanWorkflow::new(ocr.clone(), demo_geocoder(), fast_settings());

    let err = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AtlasError::RecognitionFailed(_)));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 3, "one attempt plus two retries");
}

#[tokio::test]
async fn test_hanging_engine_times_out() {
    let ocr = Arc::new(HangingOcr { calls: AtomicUsize::new(0) });
    let mut settings = fast_settings();
    settings.timeout = Duration::from_millis(20);
    settings.max_retries = 1;
    let workflow = ScanWorkflow::new(ocr.clone(), demo_geocoder(), settings);

    let err = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AtlasError::RecognitionTimeout(d) if d == Duration::from_millis(20)));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    assert_eq!(err.operator_message(), "Failed to process image. Please try again.");
}

#[tokio::test]
async fn test_cancellation_stops_recognition() {
    let ocr = HangingOcr { calls: AtomicUsize::new(0) };
    let mut settings = fast_settings();
    settings.timeout = Duration::from_secs(60);
    let workflow = ScanWorkflow::new(ocr, demo_geocoder(), settings);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = workflow
        .scan(&png(), &ProgressReporter::silent(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AtlasError::Cancelled));
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let ocr = FlakyOcr::new(5, "///index.home.raft");
    let mut settings = fast_settings();
    settings.retry_backoff = Duration::from_secs(60);
    let workflow = ScanWorkflow::new(ocr, demo_geocoder(), settings);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = workflow
        .scan(&png(), &ProgressReporter::silent(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AtlasError::Cancelled));
}

#[tokio::test]
async fn test_caller_input_errors_are_not_retried() {
    let workflow = ScanWorkflow::new(RejectingOcr, demo_geocoder(), fast_settings());

    let err = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AtlasError::InputRejected(_)));
}

#[tokio::test]
async fn test_no_address_reports_truncated_preview() {
    let geocoder = Arc::new(FixedGeocoder {
        coordinate: DEFAULT_BASE_LOCATION,
        lookups: AtomicUsize::new(0),
    });
    let ocr = FlakyOcr::new(0, "Parcel for Mr Smith, second floor, ring twice");
    let workflow = ScanWorkflow::new(ocr, geocoder.clone(), fast_settings());

    let err = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap_err();

    match &err {
        AtlasError::NoAddressFound { preview } => assert_eq!(preview, "Parcel for Mr Smith,..."),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_caller_input());
    assert_eq!(geocoder.lookups.load(Ordering::SeqCst), 0, "nothing to resolve");
}

#[tokio::test]
async fn test_progress_reaches_100_and_never_decreases() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress = ProgressReporter::from_fn(move |p| sink.lock().unwrap().push(p));

    let workflow = ScanWorkflow::new(
        FlakyOcr::new(1, "///filled.count.soap"),
        demo_geocoder(),
        fast_settings(),
    );
    workflow
        .scan(&png(), &progress, &CancellationToken::new())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
}

#[tokio::test]
async fn test_language_and_zero_confidence_pass_through() {
    let probe = Arc::new(LanguageProbe { seen: Mutex::new(Vec::new()) });
    let mut settings = fast_settings();
    settings.language = OcrLanguage::Mongolian;
    let workflow = ScanWorkflow::new(probe.clone(), demo_geocoder(), settings);

    let result = workflow
        .scan(&png(), &ProgressReporter::silent(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*probe.seen.lock().unwrap(), vec![OcrLanguage::Mongolian]);
    assert_eq!(result.address.as_str(), "///тэмээ.нохой.морь");
    assert_eq!(result.confidence, 0.0);
    let drift = (result.coordinate.lat - DEFAULT_BASE_LOCATION.lat).abs();
    assert!(drift <= 0.01, "unknown address should land near the anchor");
}

#[tokio::test]
async fn test_scan_text_for_manual_correction() {
    let workflow = ScanWorkflow::new(MockOcrEngine::new(Vec::new()), demo_geocoder(), fast_settings());

    let result = workflow.scan_text("table.lamp.house").await.unwrap();
    assert_eq!(result.address.as_str(), "///table.lamp.house");
    assert_eq!(result.confidence, 1.0);

    assert!(matches!(
        workflow.scan_text("table lamp house").await,
        Err(AtlasError::NoAddressFound { .. })
    ));
}
