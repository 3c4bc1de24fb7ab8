use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::camera::{CameraSession, MediaSource};
use crate::error::ScanFailure;

/// Scan session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Initializing,
    Streaming,
    Detecting,
    Matched,
    Stopped,
    Failed,
}

impl ScanState {
    /// Terminal states take no further action without an explicit restart.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Matched | ScanState::Stopped | ScanState::Failed)
    }
}

/// One scanning attempt: state, the owned camera session, the cancel flag,
/// and the last fatal failure.
///
/// Owned exclusively by the controller; exactly one live instance at a
/// time. The stream handle is held iff the state is Streaming or
/// Detecting — entering a terminal state releases the camera before the
/// transition completes.
pub struct ScanSession {
    state: ScanState,
    camera: CameraSession,
    cancel: CancellationToken,
    last_error: Option<ScanFailure>,
}

impl ScanSession {
    pub fn new(source: Arc<dyn MediaSource>) -> Self {
        Self {
            state: ScanState::Idle,
            camera: CameraSession::new(source),
            cancel: CancellationToken::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn last_error(&self) -> Option<&ScanFailure> {
        self.last_error.as_ref()
    }

    pub fn camera(&mut self) -> &mut CameraSession {
        &mut self.camera
    }

    /// Whether a stream handle is currently held.
    pub fn stream_held(&self) -> bool {
        self.camera.is_streaming()
    }

    /// Request cancellation; checked at the top of every loop cycle and
    /// before every reschedule.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Transition to the next state. Entering a terminal state releases
    /// the camera first, so no path can leave a device held.
    pub fn set_state(&mut self, next: ScanState) {
        if next.is_terminal() {
            self.camera.release();
        }

        if self.state != next {
            debug!("Scan session state: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Record a fatal failure and transition to Failed.
    pub fn fail(&mut self, failure: ScanFailure) {
        self.last_error = Some(failure);
        self.set_state(ScanState::Failed);
    }
}
