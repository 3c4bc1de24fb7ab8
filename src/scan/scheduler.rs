use async_trait::async_trait;
use std::time::Duration;

/// The host's cooperative "run on next frame" primitive.
///
/// The scan loop awaits this between cycles instead of recursing or
/// spinning; the runtime invokes the continuation serially.
#[async_trait]
pub trait FrameScheduler: Send + Sync {
    /// Resolve when the next display frame is due.
    async fn next_frame(&self);
}

/// Paces cycles to a fixed display refresh rate.
pub struct DisplayPacedScheduler {
    interval: Duration,
}

impl DisplayPacedScheduler {
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / refresh_hz.max(1) as f64),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl FrameScheduler for DisplayPacedScheduler {
    async fn next_frame(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Scheduler that yields to the runtime without waiting.
///
/// Keeps the cooperative suspension point but removes the pacing; used by
/// tests and hardware-free demo runs.
pub struct ImmediateScheduler;

#[async_trait]
impl FrameScheduler for ImmediateScheduler {
    async fn next_frame(&self) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_interval() {
        let scheduler = DisplayPacedScheduler::new(60);
        let millis = scheduler.interval().as_secs_f64() * 1000.0;
        assert!((millis - 16.666).abs() < 0.1);
    }

    #[test]
    fn test_zero_refresh_clamped() {
        let scheduler = DisplayPacedScheduler::new(0);
        assert_eq!(scheduler.interval(), Duration::from_secs(1));
    }
}
