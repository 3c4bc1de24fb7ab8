mod capability;
mod stub;
mod symbology;

pub use capability::{BarcodeDetector, DetectionMatch};
pub use stub::{StubDetector, StubOutcome};
pub use symbology::Symbology;
