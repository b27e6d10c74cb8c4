pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod keyboard_input;
pub mod media;

pub use app::{CameraState, CaptureController, Gallery, UiSnapshot, UiState};
pub use capture::{CaptureService, CapturedImage, FilePicker, ImageOrigin, PathListPicker};
pub use config::CamGalleryConfig;
pub use error::{CamGalleryError, CaptureError, PlatformError, Result};
pub use media::{
    CaptureSession, FacingMode, FrameSource, MediaDevices, MediaStream, SyntheticDevices,
    VideoPreview,
};
