use serde::Serialize;
use uuid::Uuid;

/// Camera lifecycle as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CameraState {
    Idle,
    Starting,
    Active,
    /// Busy while a stream is live: switching or tearing down
    Stopping,
}

/// Flags and message rendered by the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub camera_active: bool,
    pub loading: bool,
    /// Empty when there is no error
    pub error_message: String,
    pub permission_granted: bool,
}

impl UiState {
    pub fn camera_state(&self) -> CameraState {
        match (self.camera_active, self.loading) {
            (false, false) => CameraState::Idle,
            (false, true) => CameraState::Starting,
            (true, false) => CameraState::Active,
            (true, true) => CameraState::Stopping,
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}

/// Published after every controller action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiSnapshot {
    #[serde(flatten)]
    pub state: UiState,
    pub camera_state: CameraState,
    pub gallery_len: usize,
    pub selected: Option<Uuid>,
    pub has_video_input: Option<bool>,
}

impl Default for UiSnapshot {
    fn default() -> Self {
        Self {
            state: UiState::default(),
            camera_state: CameraState::Idle,
            gallery_len: 0,
            selected: None,
            has_video_input: None,
        }
    }
}
