use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::frame::VideoFrame;

use super::symbology::Symbology;

/// One symbology match reported by the detector. Immutable once produced;
/// consumed exactly once by the scan controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMatch {
    pub raw_value: String,
    pub format: Symbology,
    pub observed_at: DateTime<Utc>,
}

impl DetectionMatch {
    pub fn new<S: Into<String>>(raw_value: S, format: Symbology) -> Self {
        Self {
            raw_value: raw_value.into(),
            format,
            observed_at: Utc::now(),
        }
    }
}

/// Frame-inspection capability supplied by the host environment.
///
/// The engine treats this as an opaque dependency: it never decodes pixels
/// itself and never re-orders what the capability returns.
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    /// Whether the capability exists in the current environment.
    ///
    /// Checked once at engine start, before any camera acquisition; an
    /// unsupported capability fails the session fast with no device touched.
    fn is_supported(&self) -> bool;

    /// Inspect one frame and return zero or more matches, in the
    /// capability's own order. Errors are transient: the loop logs and
    /// reschedules.
    async fn detect(&self, frame: &VideoFrame) -> Result<Vec<DetectionMatch>, DetectError>;
}
