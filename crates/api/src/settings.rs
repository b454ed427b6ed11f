//! Application configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `CAPTURE__SECTION__KEY` environment variables.

use camera_capture::CameraConfig;
use capture_workflow::RetakePolicy;
use gallery::GalleryConfig;
use image_encoder::EncoderConfig;
use notifications::NotificationConfig;
use serde::{Deserialize, Serialize};
use storage::StoreConfig;
use tracing::Level;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Parsed `level`; unknown names are a configuration error
    pub fn max_level(&self) -> Result<Level, config::ConfigError> {
        self.level.parse::<Level>().map_err(|_| {
            config::ConfigError::Message(format!(
                "logging.level: unknown level {:?} (expected trace, debug, info, warn or error)",
                self.level
            ))
        })
    }
}

/// Capture workflow settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub retake: RetakePolicy,
}

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub camera: CameraConfig,
    pub encoder: EncoderConfig,
    pub workflow: WorkflowConfig,
    pub store: StoreConfig,
    pub notifications: NotificationConfig,
    pub gallery: GalleryConfig,
}

impl AppConfig {
    /// Load from `path` (extension optional, file may be absent) and the
    /// environment
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CAPTURE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.logging.max_level()?;
        Ok(config)
    }
}
