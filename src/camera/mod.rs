mod constraints;
mod session;
mod stub;

pub use constraints::{FacingMode, StreamConstraints};
pub use session::{CameraSession, MediaSource, MediaStream};
pub use stub::{StubMediaSource, StubStream};
