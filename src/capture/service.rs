use super::still::{encode_jpeg, CapturedImage, ImageOrigin};
use super::picker::FilePicker;
use crate::config::CamGalleryConfig;
use crate::error::CaptureError;
use crate::media::{
    CaptureSession, DeviceInfo, DeviceKind, FacingMode, FrameSource, MediaDevices,
    ResolutionHint, StreamConstraints,
};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Thin wrapper over the platform's camera and file primitives.
///
/// The service keeps no stream state of its own: sessions are returned to
/// the caller and handed back in for stop, switch and capture.
pub struct CaptureService {
    devices: Arc<dyn MediaDevices>,
    picker: Arc<dyn FilePicker>,
    resolution: ResolutionHint,
    frame_rate: u32,
    jpeg_quality: u8,
}

impl CaptureService {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        picker: Arc<dyn FilePicker>,
        config: &CamGalleryConfig,
    ) -> Self {
        Self {
            devices,
            picker,
            resolution: ResolutionHint::new(
                config.camera.resolution.0,
                config.camera.resolution.1,
            ),
            frame_rate: config.camera.fps,
            jpeg_quality: config.capture.jpeg_quality,
        }
    }

    /// Resolution requested when the caller has no preference
    pub fn default_resolution(&self) -> ResolutionHint {
        self.resolution
    }

    /// Video capture devices known to the platform
    pub async fn list_video_inputs(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        let devices = self.devices.enumerate_devices().await.map_err(|e| {
            error!("Failed to enumerate devices: {}", e);
            CaptureError::from(e)
        })?;

        let inputs: Vec<DeviceInfo> = devices
            .into_iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .collect();

        debug!("Found {} video input devices", inputs.len());
        Ok(inputs)
    }

    /// Open a live stream from the camera facing `facing`
    pub async fn request_camera_permission(
        &self,
        facing: FacingMode,
        resolution: ResolutionHint,
    ) -> Result<CaptureSession, CaptureError> {
        let constraints = StreamConstraints {
            facing,
            resolution,
            frame_rate: Some(self.frame_rate),
        };

        self.open(constraints).await.map_err(|e| {
            error!("Error requesting camera permission: {}", e);
            e
        })
    }

    /// Stop the session if there is one and clear the reference
    pub fn stop_camera_stream(&self, session: &mut Option<CaptureSession>) {
        if let Some(session) = session.take() {
            session.stop();
            info!("Camera stream {} stopped", session.id());
        }
    }

    /// Stop the current session and open the camera facing the other way.
    ///
    /// If the other camera cannot be opened, the back camera is requested
    /// instead and only that request's failure is returned.
    pub async fn switch_camera(
        &self,
        session: &mut Option<CaptureSession>,
    ) -> Result<CaptureSession, CaptureError> {
        let previous_facing = session.as_ref().and_then(|s| s.facing());
        self.stop_camera_stream(session);

        let facing = match previous_facing {
            Some(facing) => facing.opposite(),
            None => FacingMode::Back,
        };
        info!(
            "Switching camera from {:?} to {}",
            previous_facing.map(FacingMode::as_str),
            facing
        );

        let constraints = StreamConstraints {
            facing,
            resolution: self.resolution,
            frame_rate: None,
        };

        match self.open(constraints).await {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(
                    "Could not open {} camera ({}), falling back to back camera",
                    facing, e
                );
                self.request_camera_permission(FacingMode::Back, self.resolution)
                    .await
            }
        }
    }

    /// Encode the frame currently shown by `source` as a JPEG still
    pub fn capture_photo(
        &self,
        source: Option<&dyn FrameSource>,
    ) -> Result<CapturedImage, CaptureError> {
        let source = source.ok_or(CaptureError::NoActivePreview)?;

        let size = source.native_size();
        let frame = source
            .current_frame()
            .ok_or_else(|| CaptureError::capture_failed("no video frame is available"))?;

        let bytes = encode_jpeg(frame, size, self.jpeg_quality).map_err(|e| {
            error!("Error capturing photo: {}", e);
            e
        })?;

        info!(
            "Captured {}x{} photo ({} bytes)",
            size.0,
            size.1,
            bytes.len()
        );
        Ok(CapturedImage::new("image/jpeg", bytes, ImageOrigin::Camera))
    }

    /// Let the user pick up to `limit` images from local storage.
    ///
    /// Files are read concurrently and returned in selection order. Files
    /// that are not images are skipped; a file that cannot be read fails the
    /// whole import.
    pub async fn get_photos_from_gallery(
        &self,
        limit: usize,
    ) -> Result<Vec<CapturedImage>, CaptureError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let selected = self.picker.pick_images().await.map_err(|e| {
            error!("Error picking images: {}", e);
            match e {
                CaptureError::GalleryImportFailed { .. } => e,
                other => CaptureError::import_failed(other.to_string()),
            }
        })?;

        let Some(mut paths) = selected else {
            debug!("Gallery import cancelled by user");
            return Ok(Vec::new());
        };
        if paths.len() > limit {
            debug!("Limiting gallery import from {} to {} files", paths.len(), limit);
            paths.truncate(limit);
        }

        // Any unreadable file fails the whole import
        let results = join_all(paths.into_iter().map(read_image)).await;
        let mut images = Vec::with_capacity(results.len());
        for result in results {
            if let Some(image) = result? {
                images.push(image);
            }
        }

        info!("Imported {} images from gallery", images.len());
        Ok(images)
    }

    async fn open(&self, constraints: StreamConstraints) -> Result<CaptureSession, CaptureError> {
        debug!("Requesting camera stream: {:?}", constraints);
        let stream = self.devices.get_user_media(constraints).await?;
        let session = CaptureSession::new(constraints, stream);
        info!(
            "Camera stream {} opened ({}, {}x{})",
            session.id(),
            constraints.facing,
            constraints.resolution.width,
            constraints.resolution.height
        );
        Ok(session)
    }
}

async fn read_image(path: PathBuf) -> Result<Option<CapturedImage>, CaptureError> {
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        CaptureError::import_failed(format!("{}: {}", path.display(), e))
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    // Content that does not sniff as an image is dropped, not an error
    let image = CapturedImage::from_file_bytes(file_name, bytes);
    if image.is_none() {
        warn!("Skipping {}: not a supported image", path.display());
    }
    Ok(image)
}
