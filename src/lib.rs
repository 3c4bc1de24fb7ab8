pub mod camera;
pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod frame;
pub mod inventory;
pub mod scan;
pub mod store;

pub use camera::{
    CameraSession, FacingMode, MediaSource, MediaStream, StreamConstraints, StubMediaSource,
};
pub use config::ScancamConfig;
pub use detect::{BarcodeDetector, DetectionMatch, StubDetector, StubOutcome, Symbology};
pub use error::{AcquireError, DetectError, Result, ScanFailure, ScancamError, StoreError};
pub use export::ExportFormat;
pub use frame::{FrameFormat, VideoFrame};
pub use inventory::InventoryRecord;
pub use scan::{
    DisplayPacedScheduler, FrameScheduler, ScanController, ScanControllerBuilder, ScanLoop,
    ScanState,
};
pub use store::JsonFileStore;
