use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::error::DetectError;
use crate::frame::VideoFrame;

use super::capability::{BarcodeDetector, DetectionMatch};

/// Scripted outcome for one detect cycle.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// No matches in the frame
    Empty,
    /// Matches, in the order the capability would report them
    Matches(Vec<DetectionMatch>),
    /// A transient detection error
    Error(String),
}

/// Scripted detector for demo runs and tests.
///
/// Plays back a fixed sequence of per-cycle outcomes, then keeps
/// returning empty results once the script is exhausted. Detect calls are
/// counted so loop properties can be asserted.
pub struct StubDetector {
    supported: bool,
    script: Mutex<VecDeque<StubOutcome>>,
    detect_calls: AtomicUsize,
}

impl StubDetector {
    pub fn new(script: Vec<StubOutcome>) -> Self {
        Self {
            supported: true,
            script: Mutex::new(script.into()),
            detect_calls: AtomicUsize::new(0),
        }
    }

    /// A detector whose capability probe reports unsupported.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            script: Mutex::new(VecDeque::new()),
            detect_calls: AtomicUsize::new(0),
        }
    }

    /// A supported detector that never matches anything.
    pub fn always_empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of detect calls made against this detector.
    pub fn detect_count(&self) -> usize {
        self.detect_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BarcodeDetector for StubDetector {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn detect(&self, frame: &VideoFrame) -> Result<Vec<DetectionMatch>, DetectError> {
        self.detect_calls.fetch_add(1, Ordering::Relaxed);

        let outcome = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or(StubOutcome::Empty);

        match outcome {
            StubOutcome::Empty => Ok(Vec::new()),
            StubOutcome::Matches(matches) => {
                debug!(
                    "Stub detector reporting {} match(es) on frame {}",
                    matches.len(),
                    frame.id
                );
                Ok(matches)
            }
            StubOutcome::Error(message) => Err(DetectError::new(message)),
        }
    }
}
