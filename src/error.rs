use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ScancamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] AcquireError),

    #[error("Scan failed: {0}")]
    Scan(#[from] ScanFailure),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("System error: {message}")]
    System { message: String },
}

impl ScancamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScancamError>;

/// Classified camera acquisition failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("camera access denied by the user or platform")]
    PermissionDenied,

    #[error("no capture device matches the requested constraints")]
    DeviceNotFound,

    #[error("capture device error: {details}")]
    Device { details: String },
}

impl AcquireError {
    pub fn device<S: Into<String>>(details: S) -> Self {
        Self::Device {
            details: details.into(),
        }
    }
}

/// Fatal scan session failures. Surfaced to the caller at most once per
/// session and never retried automatically; the caller must restart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanFailure {
    #[error("barcode detection capability is unavailable in this environment")]
    CapabilityUnavailable,

    #[error("camera access denied by the user or platform")]
    PermissionDenied,

    #[error("no capture device matches the requested constraints")]
    DeviceNotFound,

    #[error("capture device error: {details}")]
    DeviceError { details: String },

    #[error("detector returned {consecutive_errors} consecutive errors, giving up")]
    DetectorStalled { consecutive_errors: u32 },
}

impl From<AcquireError> for ScanFailure {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::PermissionDenied => ScanFailure::PermissionDenied,
            AcquireError::DeviceNotFound => ScanFailure::DeviceNotFound,
            AcquireError::Device { details } => ScanFailure::DeviceError { details },
        }
    }
}

/// A transient per-cycle detection failure. Absorbed by the scan loop and
/// never terminal by itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("detection failed: {message}")]
pub struct DetectError {
    pub message: String,
}

impl DetectError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn timed_out(after_ms: u64) -> Self {
        Self {
            message: format!("detect call exceeded {}ms", after_ms),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record {id} not found")]
    NotFound { id: Uuid },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
