use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::camera::{MediaSource, StreamConstraints};
use crate::config::DetectorConfig;
use crate::detect::{BarcodeDetector, Symbology};
use crate::error::{Result, ScanFailure, ScancamError};

use super::detect_loop::{LoopOutcome, ScanLoop};
use super::scheduler::{DisplayPacedScheduler, FrameScheduler};
use super::session::{ScanSession, ScanState};

/// Result callback: the matched payload and its symbology.
pub type MatchCallback = Box<dyn FnOnce(String, Symbology) + Send>;

/// Failure callback: the classified fatal failure.
pub type FailureCallback = Box<dyn FnOnce(ScanFailure) + Send>;

/// The scan engine's public contract.
///
/// Starts and stops scan sessions, surfaces exactly one result or one
/// terminal error per session, and guarantees the camera is released on
/// every exit path. One live session at a time.
pub struct ScanController {
    source: Arc<dyn MediaSource>,
    detector: Arc<dyn BarcodeDetector>,
    scheduler: Arc<dyn FrameScheduler>,
    constraints: StreamConstraints,
    max_consecutive_errors: u32,
    detect_timeout: Option<Duration>,
    session: Arc<Mutex<ScanSession>>,
    drive_task: Mutex<Option<JoinHandle<()>>>,
}

impl ScanController {
    pub fn builder() -> ScanControllerBuilder {
        ScanControllerBuilder::new()
    }

    /// Start a fresh session. Valid only before the first start; use
    /// [`restart`](Self::restart) once a session has reached a terminal
    /// state.
    ///
    /// The result and failure callbacks each fire at most once per
    /// session, never both, and always after the camera stream has been
    /// released.
    pub async fn start<M, F>(&self, on_matched: M, on_failed: F) -> Result<()>
    where
        M: FnOnce(String, Symbology) + Send + 'static,
        F: FnOnce(ScanFailure) + Send + 'static,
    {
        {
            let session = self.session.lock().await;
            if session.state() != ScanState::Idle {
                return Err(ScancamError::system(
                    "scan session already started; use restart() from a terminal state",
                ));
            }
        }

        self.spawn_drive(Box::new(on_matched), Box::new(on_failed))
            .await;
        Ok(())
    }

    /// Discard a finished session and start a new one. Valid only from
    /// Stopped, Failed, or Matched.
    pub async fn restart<M, F>(&self, on_matched: M, on_failed: F) -> Result<()>
    where
        M: FnOnce(String, Symbology) + Send + 'static,
        F: FnOnce(ScanFailure) + Send + 'static,
    {
        {
            let mut session = self.session.lock().await;
            if !session.state().is_terminal() {
                return Err(ScancamError::system(
                    "restart() is only valid from a Stopped, Failed, or Matched session",
                ));
            }

            *session = ScanSession::new(Arc::clone(&self.source));
        }

        // Reap the previous drive task if it has already finished
        {
            let mut task = self.drive_task.lock().await;
            if task.as_ref().map(|t| t.is_finished()).unwrap_or(false) {
                if let Some(task) = task.take() {
                    let _ = task.await;
                }
            }
        }

        info!("Restarting scan session");
        self.spawn_drive(Box::new(on_matched), Box::new(on_failed))
            .await;
        Ok(())
    }

    /// Cancel the live session: set the cancel flag, release the camera,
    /// and prevent any further cycle from being scheduled. An in-flight
    /// detect call completes but its result is discarded.
    ///
    /// Idempotent: stopping an already stopped or terminal session is a
    /// no-op. No callback fires for a stopped session.
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;

        if session.state().is_terminal() {
            debug!("Stop requested on a terminal session; no-op");
            return;
        }

        info!("Stop requested; cancelling scan session");
        session.request_cancel();
        session.set_state(ScanState::Stopped);
    }

    /// Wait for the in-flight drive task, if any, to settle.
    pub async fn join(&self) {
        let task = self.drive_task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Scan drive task panicked: {}", e);
            }
        }
    }

    pub async fn state(&self) -> ScanState {
        self.session.lock().await.state()
    }

    pub async fn last_error(&self) -> Option<ScanFailure> {
        self.session.lock().await.last_error().cloned()
    }

    async fn spawn_drive(&self, on_matched: MatchCallback, on_failed: FailureCallback) {
        self.session
            .lock()
            .await
            .set_state(ScanState::Initializing);

        let scan_loop = ScanLoop::new(
            Arc::clone(&self.session),
            Arc::clone(&self.detector),
            Arc::clone(&self.scheduler),
            self.max_consecutive_errors,
            self.detect_timeout,
        );

        let session = Arc::clone(&self.session);
        let detector = Arc::clone(&self.detector);
        let constraints = self.constraints.clone();

        let task = tokio::spawn(async move {
            Self::drive(session, detector, scan_loop, constraints, on_matched, on_failed).await;
        });

        *self.drive_task.lock().await = Some(task);
    }

    async fn drive(
        session: Arc<Mutex<ScanSession>>,
        detector: Arc<dyn BarcodeDetector>,
        scan_loop: ScanLoop,
        constraints: StreamConstraints,
        on_matched: MatchCallback,
        on_failed: FailureCallback,
    ) {
        // The capability probe precedes any device access: an unsupported
        // environment fails fast with the camera never touched.
        if !detector.is_supported() {
            warn!("Barcode detection capability unavailable in this environment");
            let failure = ScanFailure::CapabilityUnavailable;
            session.lock().await.fail(failure.clone());
            on_failed(failure);
            return;
        }

        {
            let mut guard = session.lock().await;

            if guard.cancel_requested() {
                guard.set_state(ScanState::Stopped);
                return;
            }

            match guard.camera().acquire(&constraints).await {
                Ok(()) => guard.set_state(ScanState::Streaming),
                Err(acquire_error) => {
                    error!("Camera acquisition failed: {}", acquire_error);

                    // Defensive: release even though acquisition failed
                    guard.camera().release();

                    let failure = ScanFailure::from(acquire_error);
                    guard.fail(failure.clone());
                    drop(guard);

                    on_failed(failure);
                    return;
                }
            }
        }

        info!("Scan session streaming; entering detect loop");

        match scan_loop.run().await {
            LoopOutcome::Matched(matched) => {
                {
                    let mut guard = session.lock().await;
                    guard.set_state(ScanState::Matched);
                    debug_assert!(!guard.stream_held());
                }

                info!(
                    "Matched \"{}\" ({})",
                    matched.raw_value, matched.format
                );
                on_matched(matched.raw_value, matched.format);
            }
            LoopOutcome::Cancelled => {
                let mut guard = session.lock().await;
                if !guard.state().is_terminal() {
                    guard.set_state(ScanState::Stopped);
                }
                debug!("Scan session cancelled; no callback fires");
            }
            LoopOutcome::Stalled { consecutive_errors } => {
                let failure = ScanFailure::DetectorStalled { consecutive_errors };
                error!("Scan session failed: {}", failure);
                session.lock().await.fail(failure.clone());
                on_failed(failure);
            }
        }
    }
}

/// Builder for the scan controller
pub struct ScanControllerBuilder {
    source: Option<Arc<dyn MediaSource>>,
    detector: Option<Arc<dyn BarcodeDetector>>,
    scheduler: Option<Arc<dyn FrameScheduler>>,
    constraints: StreamConstraints,
    max_consecutive_errors: u32,
    detect_timeout: Option<Duration>,
}

impl ScanControllerBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            detector: None,
            scheduler: None,
            constraints: StreamConstraints::default(),
            max_consecutive_errors: 120,
            detect_timeout: None,
        }
    }

    pub fn source(mut self, source: Arc<dyn MediaSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn detector(mut self, detector: Arc<dyn BarcodeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn FrameScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn constraints(mut self, constraints: StreamConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Apply the retry and timeout policy from detector configuration.
    pub fn policy(mut self, config: &DetectorConfig) -> Self {
        self.max_consecutive_errors = config.max_consecutive_errors;
        self.detect_timeout = config.detect_timeout_ms.map(Duration::from_millis);
        self
    }

    pub fn build(self) -> Result<ScanController> {
        let source = self
            .source
            .ok_or_else(|| ScancamError::system("Media source must be specified"))?;
        let detector = self
            .detector
            .ok_or_else(|| ScancamError::system("Barcode detector must be specified"))?;
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(DisplayPacedScheduler::new(60)));

        let session = Arc::new(Mutex::new(ScanSession::new(Arc::clone(&source))));

        Ok(ScanController {
            source,
            detector,
            scheduler,
            constraints: self.constraints,
            max_consecutive_errors: self.max_consecutive_errors,
            detect_timeout: self.detect_timeout,
            session,
            drive_task: Mutex::new(None),
        })
    }
}

impl Default for ScanControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
