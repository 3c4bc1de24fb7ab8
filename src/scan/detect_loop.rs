use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::detect::{BarcodeDetector, DetectionMatch};
use crate::error::DetectError;
use crate::frame::VideoFrame;

use super::scheduler::FrameScheduler;
use super::session::{ScanSession, ScanState};

/// How a run of the scan loop ended.
#[derive(Debug)]
pub enum LoopOutcome {
    /// The first match of a non-empty detect result; the rest of that
    /// cycle's matches were discarded.
    Matched(DetectionMatch),
    /// Cancellation was observed, or the stream was gone.
    Cancelled,
    /// The consecutive transient-error cap was reached.
    Stalled { consecutive_errors: u32 },
}

/// The repeating detect cycle, decoupled from rendering.
///
/// One cycle: check cancellation and the stream, pull the current frame,
/// run the detector, then either finish or reschedule via the frame
/// scheduler. Cycles are strictly sequential; cycle N+1 is scheduled only
/// after cycle N's detect call has resolved.
pub struct ScanLoop {
    session: Arc<Mutex<ScanSession>>,
    detector: Arc<dyn BarcodeDetector>,
    scheduler: Arc<dyn FrameScheduler>,
    max_consecutive_errors: u32,
    detect_timeout: Option<Duration>,
}

impl ScanLoop {
    pub fn new(
        session: Arc<Mutex<ScanSession>>,
        detector: Arc<dyn BarcodeDetector>,
        scheduler: Arc<dyn FrameScheduler>,
        max_consecutive_errors: u32,
        detect_timeout: Option<Duration>,
    ) -> Self {
        Self {
            session,
            detector,
            scheduler,
            max_consecutive_errors,
            detect_timeout,
        }
    }

    /// Drive detect cycles until a match, cancellation, or a stall.
    pub async fn run(&self) -> LoopOutcome {
        let mut consecutive_errors = 0u32;
        let mut cycles = 0u64;

        loop {
            // Cancellation and stream checks happen at the top of every
            // cycle, before any detect call.
            let frame = {
                let mut session = self.session.lock().await;

                if session.cancel_requested() || !session.stream_held() {
                    debug!("Scan loop terminating after {} cycle(s)", cycles);
                    return LoopOutcome::Cancelled;
                }

                let frame = session.camera().current_frame();
                if frame.is_some() {
                    session.set_state(ScanState::Detecting);
                }
                frame
            };

            if let Some(frame) = frame {
                cycles += 1;
                let result = self.detect_once(&frame).await;

                let mut session = self.session.lock().await;

                // A cancel that raced the in-flight call discards its result
                if session.cancel_requested() {
                    debug!("Discarding detect result after cancellation");
                    return LoopOutcome::Cancelled;
                }

                match result {
                    Ok(matches) => {
                        consecutive_errors = 0;

                        let total = matches.len();
                        if let Some(first) = matches.into_iter().next() {
                            if total > 1 {
                                debug!("Discarding {} additional match(es)", total - 1);
                            }
                            return LoopOutcome::Matched(first);
                        }

                        session.set_state(ScanState::Streaming);
                    }
                    Err(error) => {
                        consecutive_errors += 1;
                        warn!(
                            "Transient detection error ({} consecutive): {}",
                            consecutive_errors, error
                        );

                        if self.max_consecutive_errors > 0
                            && consecutive_errors >= self.max_consecutive_errors
                        {
                            return LoopOutcome::Stalled { consecutive_errors };
                        }

                        session.set_state(ScanState::Streaming);
                    }
                }
            }

            self.scheduler.next_frame().await;
        }
    }

    async fn detect_once(&self, frame: &VideoFrame) -> Result<Vec<DetectionMatch>, DetectError> {
        match self.detect_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.detector.detect(frame)).await {
                Ok(result) => result,
                Err(_) => Err(DetectError::timed_out(limit.as_millis() as u64)),
            },
            None => self.detector.detect(frame).await,
        }
    }
}
