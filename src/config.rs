use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScancamConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Which way the camera should face ("user" or "environment")
    #[serde(default = "default_facing")]
    pub facing: String,

    /// Preferred capture resolution (width, height)
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),

    /// Display refresh rate the scan loop paces itself to
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectorConfig {
    /// Symbologies the detector is asked for, by wire name (e.g. "ean_13")
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,

    /// Consecutive transient detect errors tolerated before the session
    /// fails with DetectorStalled (0 disables the cap)
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Optional per-detect-call timeout in milliseconds; a timed-out call
    /// counts as one transient error
    pub detect_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Path of the JSON file backing the record store
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl ScancamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("scancam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("camera.facing", default_facing())?
            .set_default(
                "camera.resolution",
                vec![default_resolution().0, default_resolution().1],
            )?
            .set_default("camera.refresh_hz", default_refresh_hz())?
            .set_default("detector.formats", default_formats())?
            .set_default(
                "detector.max_consecutive_errors",
                default_max_consecutive_errors(),
            )?
            .set_default("store.path", default_store_path())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with SCANCAM_ prefix
            .add_source(Environment::with_prefix("SCANCAM").separator("_"))
            .build()?;

        let config: ScancamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.facing != "user" && self.camera.facing != "environment" {
            return Err(ConfigError::Message(format!(
                "Camera facing must be \"user\" or \"environment\", got \"{}\"",
                self.camera.facing
            )));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.refresh_hz == 0 {
            return Err(ConfigError::Message(
                "Camera refresh_hz must be greater than 0".to_string(),
            ));
        }

        if self.detector.formats.is_empty() {
            return Err(ConfigError::Message(
                "Detector formats must not be empty".to_string(),
            ));
        }

        if self.store.path.is_empty() {
            return Err(ConfigError::Message(
                "Store path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ScancamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                facing: default_facing(),
                resolution: default_resolution(),
                refresh_hz: default_refresh_hz(),
            },
            detector: DetectorConfig {
                formats: default_formats(),
                max_consecutive_errors: default_max_consecutive_errors(),
                detect_timeout_ms: None,
            },
            store: StoreConfig {
                path: default_store_path(),
            },
        }
    }
}

// Default value functions
fn default_facing() -> String {
    "environment".to_string()
}
fn default_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_refresh_hz() -> u32 {
    60
}

fn default_formats() -> Vec<String> {
    [
        "qr_code",
        "code_128",
        "ean_13",
        "code_39",
        "code_93",
        "upc_a",
        "upc_e",
        "ean_8",
        "itf",
        "pdf417",
        "aztec",
        "data_matrix",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_max_consecutive_errors() -> u32 {
    120
}

fn default_store_path() -> String {
    "data.json".to_string()
}
