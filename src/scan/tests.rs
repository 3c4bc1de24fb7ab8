use super::*;
use crate::camera::{FacingMode, MediaSource, StreamConstraints, StubMediaSource};
use crate::detect::{BarcodeDetector, DetectionMatch, StubDetector, StubOutcome, Symbology};
use crate::error::{AcquireError, DetectError, ScanFailure};
use crate::frame::VideoFrame;
use async_trait::async_trait;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::time::Duration;

fn test_constraints() -> StreamConstraints {
    StreamConstraints {
        facing: FacingMode::Environment,
        ideal_width: 64,
        ideal_height: 48,
    }
}

fn build_controller(source: &Arc<StubMediaSource>, detector: &Arc<StubDetector>) -> ScanController {
    ScanController::builder()
        .source(Arc::clone(source) as Arc<dyn MediaSource>)
        .detector(Arc::clone(detector) as Arc<dyn BarcodeDetector>)
        .scheduler(Arc::new(ImmediateScheduler))
        .constraints(test_constraints())
        .build()
        .expect("controller builds")
}

/// Recorded result callbacks: (raw value, symbology, track shutdowns
/// observed at callback time).
type MatchLog = Arc<StdMutex<Vec<(String, Symbology, usize)>>>;
type FailureLog = Arc<StdMutex<Vec<(ScanFailure, usize)>>>;

fn start_args(
    source: &Arc<StubMediaSource>,
) -> (
    MatchLog,
    FailureLog,
    impl FnOnce(String, Symbology) + Send + 'static,
    impl FnOnce(ScanFailure) + Send + 'static,
) {
    let matched: MatchLog = Arc::new(StdMutex::new(Vec::new()));
    let failed: FailureLog = Arc::new(StdMutex::new(Vec::new()));

    let matched_log = Arc::clone(&matched);
    let match_probe = Arc::clone(source);
    let on_matched = move |value: String, format: Symbology| {
        matched_log
            .lock()
            .unwrap()
            .push((value, format, match_probe.shutdown_count()));
    };

    let failed_log = Arc::clone(&failed);
    let failure_probe = Arc::clone(source);
    let on_failed = move |failure: ScanFailure| {
        failed_log
            .lock()
            .unwrap()
            .push((failure, failure_probe.shutdown_count()));
    };

    (matched, failed, on_matched, on_failed)
}

async fn wait_for_detect_calls(detector: &StubDetector, at_least: usize) {
    for _ in 0..500 {
        if detector.detect_count() >= at_least {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!(
        "detector never reached {} calls (got {})",
        at_least,
        detector.detect_count()
    );
}

#[tokio::test]
async fn test_unsupported_capability_fails_fast() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::unsupported());
    let controller = build_controller(&source, &detector);

    let (matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Failed);
    assert_eq!(
        controller.last_error().await,
        Some(ScanFailure::CapabilityUnavailable)
    );

    // Camera acquisition was never attempted
    assert_eq!(source.acquire_count(), 0);
    assert_eq!(detector.detect_count(), 0);

    assert!(matched.lock().unwrap().is_empty());
    assert_eq!(failed.lock().unwrap().len(), 1);
    assert_eq!(failed.lock().unwrap()[0].0, ScanFailure::CapabilityUnavailable);
}

#[tokio::test]
async fn test_match_on_fourth_cycle() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::new(vec![
        StubOutcome::Empty,
        StubOutcome::Empty,
        StubOutcome::Empty,
        StubOutcome::Matches(vec![DetectionMatch::new("12345", Symbology::Ean13)]),
    ]));
    let controller = build_controller(&source, &detector);

    let (matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Matched);
    assert_eq!(detector.detect_count(), 4);

    let matched = matched.lock().unwrap();
    assert_eq!(matched.len(), 1);
    let (value, format, shutdowns_at_callback) = &matched[0];
    assert_eq!(value, "12345");
    assert_eq!(*format, Symbology::Ean13);
    // Stream was released before the callback fired
    assert_eq!(*shutdowns_at_callback, 1);

    assert!(failed.lock().unwrap().is_empty());
    assert_eq!(source.shutdown_count(), 1);
}

#[tokio::test]
async fn test_first_match_wins() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::new(vec![StubOutcome::Matches(vec![
        DetectionMatch::new("first", Symbology::QrCode),
        DetectionMatch::new("second", Symbology::Ean13),
        DetectionMatch::new("third", Symbology::Code128),
    ])]));
    let controller = build_controller(&source, &detector);

    let (matched, _failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Matched);

    // Exactly one callback, carrying only the first element
    let matched = matched.lock().unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].0, "first");
    assert_eq!(matched[0].1, Symbology::QrCode);
}

#[tokio::test]
async fn test_permission_denied_is_fatal() {
    let source = Arc::new(StubMediaSource::failing(AcquireError::PermissionDenied));
    let detector = Arc::new(StubDetector::always_empty());
    let controller = build_controller(&source, &detector);

    let (matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Failed);
    assert_eq!(
        controller.last_error().await,
        Some(ScanFailure::PermissionDenied)
    );

    // One acquisition attempt, zero detect calls, no stream ever handed out
    assert_eq!(source.acquire_count(), 1);
    assert_eq!(detector.detect_count(), 0);
    assert_eq!(source.shutdown_count(), 0);

    assert!(matched.lock().unwrap().is_empty());
    assert_eq!(failed.lock().unwrap().len(), 1);
    assert_eq!(failed.lock().unwrap()[0].0, ScanFailure::PermissionDenied);
}

#[tokio::test]
async fn test_acquire_failure_classification() {
    let cases = [
        (AcquireError::DeviceNotFound, ScanFailure::DeviceNotFound),
        (
            AcquireError::device("device busy"),
            ScanFailure::DeviceError {
                details: "device busy".to_string(),
            },
        ),
    ];

    for (acquire_error, expected) in cases {
        let source = Arc::new(StubMediaSource::failing(acquire_error));
        let detector = Arc::new(StubDetector::always_empty());
        let controller = build_controller(&source, &detector);

        let (_matched, failed, on_matched, on_failed) = start_args(&source);
        controller.start(on_matched, on_failed).await.unwrap();
        controller.join().await;

        assert_eq!(controller.state().await, ScanState::Failed);
        assert_eq!(failed.lock().unwrap()[0].0, expected);
    }
}

#[tokio::test]
async fn test_stop_mid_loop() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::always_empty());
    let controller = build_controller(&source, &detector);

    let (matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();

    // Let the loop run a couple of cycles, then cancel
    wait_for_detect_calls(&detector, 2).await;
    controller.stop().await;
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Stopped);
    assert_eq!(source.shutdown_count(), 1);

    // No callback fires for a stopped session
    assert!(matched.lock().unwrap().is_empty());
    assert!(failed.lock().unwrap().is_empty());

    // No detect call occurs after cancellation was observed
    let calls_after_stop = detector.detect_count();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(detector.detect_count(), calls_after_stop);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::always_empty());
    let controller = build_controller(&source, &detector);

    let (_matched, _failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();

    wait_for_detect_calls(&detector, 1).await;

    controller.stop().await;
    controller.stop().await;
    controller.stop().await;
    controller.join().await;
    controller.stop().await;

    assert_eq!(controller.state().await, ScanState::Stopped);
    // Underlying tracks stopped exactly once across all stop calls
    assert_eq!(source.shutdown_count(), 1);
}

#[tokio::test]
async fn test_transient_errors_are_absorbed() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::new(vec![
        StubOutcome::Error("glare".to_string()),
        StubOutcome::Error("blur".to_string()),
        StubOutcome::Empty,
        StubOutcome::Matches(vec![DetectionMatch::new("ok", Symbology::QrCode)]),
    ]));
    let controller = build_controller(&source, &detector);

    let (matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    // Transient errors never surfaced; the session still matched
    assert_eq!(controller.state().await, ScanState::Matched);
    assert_eq!(detector.detect_count(), 4);
    assert_eq!(matched.lock().unwrap().len(), 1);
    assert!(failed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_consecutive_errors_escalate_to_stall() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::new(vec![
        StubOutcome::Error("stuck".to_string()),
        StubOutcome::Error("stuck".to_string()),
        StubOutcome::Error("stuck".to_string()),
    ]));

    let mut policy = crate::config::ScancamConfig::default().detector;
    policy.max_consecutive_errors = 3;

    let controller = ScanController::builder()
        .source(Arc::clone(&source) as Arc<dyn MediaSource>)
        .detector(Arc::clone(&detector) as Arc<dyn BarcodeDetector>)
        .scheduler(Arc::new(ImmediateScheduler))
        .constraints(test_constraints())
        .policy(&policy)
        .build()
        .expect("controller builds");

    let (matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Failed);
    assert_eq!(
        controller.last_error().await,
        Some(ScanFailure::DetectorStalled {
            consecutive_errors: 3
        })
    );
    assert_eq!(detector.detect_count(), 3);
    assert_eq!(source.shutdown_count(), 1);

    assert!(matched.lock().unwrap().is_empty());
    let failed = failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    // Stream was released before the failure callback fired
    assert_eq!(failed[0].1, 1);
}

/// Detector whose detect call never resolves.
struct HangingDetector;

#[async_trait]
impl BarcodeDetector for HangingDetector {
    fn is_supported(&self) -> bool {
        true
    }

    async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<DetectionMatch>, DetectError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_detect_timeout_counts_as_transient() {
    let source = Arc::new(StubMediaSource::new());

    let mut policy = crate::config::ScancamConfig::default().detector;
    policy.max_consecutive_errors = 2;
    policy.detect_timeout_ms = Some(5);

    let controller = ScanController::builder()
        .source(Arc::clone(&source) as Arc<dyn MediaSource>)
        .detector(Arc::new(HangingDetector) as Arc<dyn BarcodeDetector>)
        .scheduler(Arc::new(ImmediateScheduler))
        .constraints(test_constraints())
        .policy(&policy)
        .build()
        .expect("controller builds");

    let (_matched, failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Failed);
    assert_eq!(
        controller.last_error().await,
        Some(ScanFailure::DetectorStalled {
            consecutive_errors: 2
        })
    );
    assert_eq!(failed.lock().unwrap().len(), 1);
    assert_eq!(source.shutdown_count(), 1);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::always_empty());
    let controller = build_controller(&source, &detector);

    let (_matched, _failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();

    let (_m2, _f2, on_matched, on_failed) = start_args(&source);
    assert!(controller.start(on_matched, on_failed).await.is_err());

    controller.stop().await;
    controller.join().await;
}

#[tokio::test]
async fn test_restart_only_from_terminal_state() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::always_empty());
    let controller = build_controller(&source, &detector);

    let (_matched, _failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    wait_for_detect_calls(&detector, 1).await;

    // Running session refuses restart
    let (_m2, _f2, on_matched, on_failed) = start_args(&source);
    assert!(controller.restart(on_matched, on_failed).await.is_err());

    controller.stop().await;
    controller.join().await;
    assert_eq!(controller.state().await, ScanState::Stopped);

    // Stopped session restarts into a fresh scan
    let calls_before_restart = detector.detect_count();
    let (matched, _failed, on_matched, on_failed) = start_args(&source);
    controller.restart(on_matched, on_failed).await.unwrap();
    wait_for_detect_calls(&detector, calls_before_restart + 1).await;
    controller.stop().await;
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Stopped);
    assert!(matched.lock().unwrap().is_empty());
    assert_eq!(source.acquire_count(), 2);
}

#[tokio::test]
async fn test_restart_after_match_scans_again() {
    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::new(vec![
        StubOutcome::Matches(vec![DetectionMatch::new("one", Symbology::Ean13)]),
        StubOutcome::Matches(vec![DetectionMatch::new("two", Symbology::QrCode)]),
    ]));
    let controller = build_controller(&source, &detector);

    let (matched, _failed, on_matched, on_failed) = start_args(&source);
    controller.start(on_matched, on_failed).await.unwrap();
    controller.join().await;
    assert_eq!(controller.state().await, ScanState::Matched);

    let (matched_again, _failed, on_matched, on_failed) = start_args(&source);
    controller.restart(on_matched, on_failed).await.unwrap();
    controller.join().await;

    assert_eq!(controller.state().await, ScanState::Matched);
    assert_eq!(matched.lock().unwrap()[0].0, "one");
    assert_eq!(matched_again.lock().unwrap()[0].0, "two");

    // Each session released its own stream
    assert_eq!(source.acquire_count(), 2);
    assert_eq!(source.shutdown_count(), 2);
}

#[tokio::test]
async fn test_builder_requires_source_and_detector() {
    let result = ScanController::builder().build();
    assert!(result.is_err());

    let result = ScanController::builder()
        .source(Arc::new(StubMediaSource::new()) as Arc<dyn MediaSource>)
        .build();
    assert!(result.is_err());
}
