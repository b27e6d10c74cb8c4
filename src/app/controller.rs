use super::gallery::Gallery;
use super::state::{CameraState, UiSnapshot, UiState};
use crate::capture::{CaptureService, CapturedImage};
use crate::config::CamGalleryConfig;
use crate::error::CaptureError;
use crate::media::{CaptureSession, FacingMode, ResolutionHint, VideoPreview};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const CAMERA_INACTIVE_MESSAGE: &str = "The camera is not active";
const SWITCH_FAILED_MESSAGE: &str = "Could not switch camera";

/// UI-facing state for camera capture and the image gallery.
///
/// Every action catches its own errors: failures end up in
/// `state().error_message` and `loading` is always cleared on return.
pub struct CaptureController {
    service: CaptureService,
    preview: VideoPreview,
    session: Option<CaptureSession>,
    state: UiState,
    pub(super) gallery: Gallery,
    selected: Option<CapturedImage>,
    last_capture: Option<CapturedImage>,
    has_video_input: Option<bool>,
    facing: FacingMode,
    start_facing: FacingMode,
    resolution: ResolutionHint,
    import_limit: usize,
    auto_stop_after_capture: bool,
    snapshots: watch::Sender<UiSnapshot>,
}

impl CaptureController {
    /// Create a controller. The camera is not started.
    pub fn new(service: CaptureService, config: &CamGalleryConfig) -> Self {
        let (snapshots, _) = watch::channel(UiSnapshot::default());

        Self {
            preview: VideoPreview::new(Duration::from_millis(
                config.camera.preview_ready_timeout_ms,
            )),
            resolution: service.default_resolution(),
            service,
            session: None,
            state: UiState::default(),
            gallery: Gallery::new(),
            selected: None,
            last_capture: None,
            has_video_input: None,
            facing: config.camera.facing,
            start_facing: config.camera.facing,
            import_limit: config.gallery.import_limit,
            auto_stop_after_capture: config.controller.auto_stop_after_capture,
            snapshots,
        }
    }

    /// Check whether any camera is present without opening it
    pub async fn init(&mut self) {
        match self.service.list_video_inputs().await {
            Ok(inputs) => {
                info!("{} video input device(s) available", inputs.len());
                self.has_video_input = Some(!inputs.is_empty());
            }
            Err(e) => {
                warn!("Error enumerating devices: {}", e);
            }
        }
        self.publish();
    }

    pub async fn start_camera(&mut self) {
        if self.state.camera_active {
            debug!("Camera already active");
            return;
        }

        self.state.loading = true;
        self.state.error_message.clear();
        self.publish();

        if let Err(e) = self.open_preview().await {
            error!("Error starting camera: {}", e);
            self.release_camera();
            self.state.error_message = e.user_message();
        }

        self.state.loading = false;
        self.publish();
    }

    async fn open_preview(&mut self) -> Result<(), CaptureError> {
        // Always start on the configured camera
        let session = self
            .service
            .request_camera_permission(self.start_facing, self.resolution)
            .await?;
        self.state.permission_granted = true;
        self.facing = session.facing().unwrap_or(self.start_facing);

        self.session = Some(session.clone());
        self.preview.bind(session);
        self.preview.wait_until_ready().await?;
        self.preview.play()?;

        self.state.camera_active = true;
        info!("Camera preview started");
        Ok(())
    }

    /// Stop the camera if the preview has a stream bound
    pub fn stop_camera(&mut self) {
        if !self.preview.is_bound() {
            return;
        }

        self.release_camera();
        info!("Camera stopped");
        self.publish();
    }

    fn release_camera(&mut self) {
        self.service.stop_camera_stream(&mut self.session);
        self.preview.unbind();
        self.state.camera_active = false;
    }

    pub async fn switch_camera(&mut self) {
        if !self.state.camera_active {
            return;
        }

        self.state.loading = true;
        self.publish();

        if let Err(e) = self.swap_preview().await {
            error!("Error switching camera: {}", e);
            self.release_camera();
            self.state.error_message = SWITCH_FAILED_MESSAGE.to_string();
        }

        self.state.loading = false;
        self.publish();
    }

    async fn swap_preview(&mut self) -> Result<(), CaptureError> {
        let session = self.service.switch_camera(&mut self.session).await?;

        self.session = Some(session.clone());
        self.preview.bind(session);
        self.preview.wait_until_ready().await?;
        self.preview.play()?;

        // Backends that do not report a facing keep the previous one
        if let Some(facing) = self.session.as_ref().and_then(|s| s.facing()) {
            self.facing = facing;
        }
        info!("Camera switched to {}", self.facing);
        Ok(())
    }

    /// Capture the frame on screen and put it at the front of the gallery
    pub fn capture_photo(&mut self) {
        if !self.state.camera_active {
            self.state.error_message = CAMERA_INACTIVE_MESSAGE.to_string();
            self.publish();
            return;
        }

        match self.service.capture_photo(self.preview.frame_source()) {
            Ok(image) => {
                self.gallery.prepend(image.clone());
                self.last_capture = Some(image);
                if self.auto_stop_after_capture {
                    self.stop_camera();
                }
            }
            Err(e) => {
                error!("Error capturing photo: {}", e);
                self.state.error_message = e.user_message();
            }
        }
        self.publish();
    }

    /// Import images picked by the user and show the first of them
    pub async fn load_from_gallery(&mut self) {
        self.state.error_message.clear();
        self.state.loading = true;
        self.publish();

        match self.service.get_photos_from_gallery(self.import_limit).await {
            Ok(images) => {
                if let Some(first) = images.first().cloned() {
                    debug!("Adding {} imported images to gallery", images.len());
                    self.gallery.prepend_all(images);
                    self.select_image(first);
                    if self.state.camera_active {
                        self.stop_camera();
                    }
                }
            }
            Err(e) => {
                error!("Error loading images: {}", e);
                self.state.error_message = e.user_message();
            }
        }

        self.state.loading = false;
        self.publish();
    }

    /// Show `image` full size. A live preview is stopped.
    pub fn select_image(&mut self, image: CapturedImage) {
        debug!("Selected image {}", image.id());
        self.selected = Some(image);

        if self.state.camera_active {
            self.stop_camera();
        }
        self.publish();
    }

    /// Select the gallery entry at `index`
    pub fn select_index(&mut self, index: usize) -> Result<(), CaptureError> {
        let image = self
            .gallery
            .get(index)
            .cloned()
            .ok_or(CaptureError::IndexOutOfRange {
                index,
                len: self.gallery.len(),
            })?;
        self.select_image(image);
        Ok(())
    }

    /// Remove the gallery entry at `index`, clearing the selection if it was shown
    pub fn delete_image(&mut self, index: usize) -> Result<CapturedImage, CaptureError> {
        let removed = self.gallery.remove(index)?;

        if self.selected.as_ref() == Some(&removed) {
            self.selected = None;
        }

        debug!("Deleted image {} at index {}", removed.id(), index);
        self.publish();
        Ok(removed)
    }

    pub fn clear_gallery(&mut self) {
        self.gallery.clear();
        self.selected = None;
        self.last_capture = None;
        info!("Gallery cleared");
        self.publish();
    }

    /// Release the camera. Must be called before the controller goes away;
    /// dropping the controller does the same.
    pub fn dispose(&mut self) {
        self.stop_camera();
        if self.session.is_some() {
            self.release_camera();
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn camera_state(&self) -> CameraState {
        self.state.camera_state()
    }

    pub fn gallery(&self) -> &[CapturedImage] {
        self.gallery.as_slice()
    }

    pub fn selected_image(&self) -> Option<&CapturedImage> {
        self.selected.as_ref()
    }

    pub fn last_capture(&self) -> Option<&CapturedImage> {
        self.last_capture.as_ref()
    }

    pub fn has_video_input(&self) -> Option<bool> {
        self.has_video_input
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            state: self.state.clone(),
            camera_state: self.state.camera_state(),
            gallery_len: self.gallery.len(),
            selected: self.selected.as_ref().map(CapturedImage::id),
            has_video_input: self.has_video_input,
        }
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<UiSnapshot> {
        self.snapshots.subscribe()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.dispose();
    }
}
