use crate::media::FacingMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CamGalleryConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub gallery: GalleryConfig,
    pub controller: ControllerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Facing direction requested when the camera is started
    #[serde(default = "default_camera_facing")]
    pub facing: FacingMode,

    /// Ideal resolution hint (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Ideal frame rate hint
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Device index used for the front camera (e.g., 1 for /dev/video1)
    #[serde(default = "default_front_device")]
    pub front_device: u32,

    /// Device index used for the back camera
    #[serde(default = "default_back_device")]
    pub back_device: u32,

    /// How long to wait for the first preview frame before giving up
    #[serde(default = "default_preview_ready_timeout_ms")]
    pub preview_ready_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// JPEG quality for captured stills (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Maximum number of files taken from one gallery import
    #[serde(default = "default_import_limit")]
    pub import_limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Stop the camera after every successful capture
    #[serde(default = "default_auto_stop_after_capture")]
    pub auto_stop_after_capture: bool,
}

impl CamGalleryConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.facing", default_camera_facing().as_str())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.front_device", default_front_device())?
            .set_default("camera.back_device", default_back_device())?
            .set_default(
                "camera.preview_ready_timeout_ms",
                default_preview_ready_timeout_ms(),
            )?
            .set_default("capture.jpeg_quality", default_jpeg_quality() as u64)?
            .set_default("gallery.import_limit", default_import_limit() as u64)?
            .set_default(
                "controller.auto_stop_after_capture",
                default_auto_stop_after_capture(),
            )?
            .add_source(File::with_name(&path_str).required(false))
            // CAMGALLERY_CAMERA__FPS=15 style overrides
            .add_source(
                Environment::with_prefix("CAMGALLERY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: CamGalleryConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.front_device == self.camera.back_device {
            return Err(ConfigError::Message(
                "Front and back cameras must use different devices".to_string(),
            ));
        }

        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.gallery.import_limit == 0 {
            return Err(ConfigError::Message(
                "Gallery import limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for CamGalleryConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                facing: default_camera_facing(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                front_device: default_front_device(),
                back_device: default_back_device(),
                preview_ready_timeout_ms: default_preview_ready_timeout_ms(),
            },
            capture: CaptureConfig {
                jpeg_quality: default_jpeg_quality(),
            },
            gallery: GalleryConfig {
                import_limit: default_import_limit(),
            },
            controller: ControllerConfig {
                auto_stop_after_capture: default_auto_stop_after_capture(),
            },
        }
    }
}

fn default_camera_facing() -> FacingMode {
    FacingMode::Back
}
fn default_camera_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_front_device() -> u32 {
    1
}
fn default_back_device() -> u32 {
    0
}
fn default_preview_ready_timeout_ms() -> u64 {
    5000
}

fn default_jpeg_quality() -> u8 {
    92
}

fn default_import_limit() -> usize {
    5
}

fn default_auto_stop_after_capture() -> bool {
    false
}
