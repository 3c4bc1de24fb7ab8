use crate::error::AcquireError;
use crate::frame::VideoFrame;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::constraints::StreamConstraints;

/// A live device video stream handed out by a [`MediaSource`].
///
/// The stream is exclusively owned by one [`CameraSession`] at a time;
/// `shutdown` stops every track and is called at most once per stream.
pub trait MediaStream: Send {
    /// Latest frame from the stream, if one is available yet.
    fn current_frame(&mut self) -> Option<VideoFrame>;

    /// Stop every track of the stream.
    fn shutdown(&mut self);
}

/// Host capability that acquires device video streams.
///
/// Implemented by the embedding environment and injected into the engine;
/// the engine never opens devices itself.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, AcquireError>;
}

/// Exclusive owner of one device video stream.
///
/// The capture indicator of the underlying device follows acquire/release;
/// it is not separately modeled.
pub struct CameraSession {
    source: Arc<dyn MediaSource>,
    stream: Option<Box<dyn MediaStream>>,
}

impl CameraSession {
    pub fn new(source: Arc<dyn MediaSource>) -> Self {
        Self {
            source,
            stream: None,
        }
    }

    /// Acquire a stream matching the constraints. Holding two streams at
    /// once is a usage error.
    pub async fn acquire(&mut self, constraints: &StreamConstraints) -> Result<(), AcquireError> {
        if self.stream.is_some() {
            warn!("Acquire requested while a stream is already held");
            return Err(AcquireError::device(
                "a stream is already held by this session",
            ));
        }

        info!(
            "Acquiring camera stream (facing {}, ideal {}x{})",
            constraints.facing.as_str(),
            constraints.ideal_width,
            constraints.ideal_height
        );

        let stream = self.source.acquire(constraints).await?;
        self.stream = Some(stream);

        debug!("Camera stream acquired");
        Ok(())
    }

    /// Stop every track of the held stream and clear the handle.
    ///
    /// Idempotent: releasing when no stream is held is a no-op, never an
    /// error, and is safe from any state.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing camera stream");
            stream.shutdown();
            info!("Camera stream released");
        }
    }

    /// Whether a stream is currently held.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Latest frame from the held stream, if any.
    pub fn current_frame(&mut self) -> Option<VideoFrame> {
        self.stream.as_mut().and_then(|s| s.current_frame())
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}
