use crate::error::AcquireError;
use crate::frame::{FrameFormat, VideoFrame};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, trace};

use super::constraints::StreamConstraints;
use super::session::{MediaSource, MediaStream};

/// Hardware-free media source producing synthetic grayscale frames.
///
/// Serves demo runs on machines without a camera, and doubles as the test
/// double for lifecycle assertions: acquire and shutdown calls are counted.
pub struct StubMediaSource {
    fail_with: Option<AcquireError>,
    acquire_calls: Arc<AtomicUsize>,
    shutdown_calls: Arc<AtomicUsize>,
}

impl StubMediaSource {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            acquire_calls: Arc::new(AtomicUsize::new(0)),
            shutdown_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every acquire attempt fails with the given error.
    pub fn failing(error: AcquireError) -> Self {
        Self {
            fail_with: Some(error),
            acquire_calls: Arc::new(AtomicUsize::new(0)),
            shutdown_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of acquire attempts made against this source.
    pub fn acquire_count(&self) -> usize {
        self.acquire_calls.load(Ordering::Relaxed)
    }

    /// Number of track shutdowns across all streams handed out.
    pub fn shutdown_count(&self) -> usize {
        self.shutdown_calls.load(Ordering::Relaxed)
    }
}

impl Default for StubMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for StubMediaSource {
    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, AcquireError> {
        self.acquire_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(error) = &self.fail_with {
            debug!("Stub media source failing acquire: {}", error);
            return Err(error.clone());
        }

        debug!(
            "Stub media source handing out {}x{} synthetic stream",
            constraints.ideal_width, constraints.ideal_height
        );

        Ok(Box::new(StubStream {
            frame_counter: 0,
            width: constraints.ideal_width,
            height: constraints.ideal_height,
            stopped: false,
            shutdown_calls: Arc::clone(&self.shutdown_calls),
        }))
    }
}

/// Synthetic stream backing [`StubMediaSource`].
pub struct StubStream {
    frame_counter: u64,
    width: u32,
    height: u32,
    stopped: bool,
    shutdown_calls: Arc<AtomicUsize>,
}

impl MediaStream for StubStream {
    fn current_frame(&mut self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }

        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        // Flat gray field that drifts per frame, enough to exercise the
        // detect path without real optics.
        let pattern_byte = (frame_id % 256) as u8;
        let data = vec![pattern_byte; self.width as usize * self.height as usize];

        trace!(
            "Generated synthetic frame {} ({}x{})",
            frame_id,
            self.width,
            self.height
        );

        Some(VideoFrame::new(
            frame_id,
            SystemTime::now(),
            data,
            self.width,
            self.height,
            FrameFormat::Luma8,
        ))
    }

    fn shutdown(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.shutdown_calls.fetch_add(1, Ordering::Relaxed);
            debug!("Stub stream tracks stopped");
        }
    }
}
