use crate::config::CameraConfig;

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Front-facing camera
    User,
    /// Rear-facing camera
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

/// Constraints passed to the media source when acquiring a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: FacingMode,
    /// Preferred width in pixels; the source may deliver less
    pub ideal_width: u32,
    /// Preferred height in pixels; the source may deliver less
    pub ideal_height: u32,
}

impl StreamConstraints {
    pub fn from_config(config: &CameraConfig) -> Self {
        let facing = if config.facing == "user" {
            FacingMode::User
        } else {
            FacingMode::Environment
        };

        Self {
            facing,
            ideal_width: config.resolution.0,
            ideal_height: config.resolution.1,
        }
    }
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}
