use super::session::CaptureSession;
use super::types::RawFrame;
use crate::error::CaptureError;
use std::time::Duration;
use tracing::{debug, warn};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Something a still image can be captured from
pub trait FrameSource: Send + Sync {
    /// Native resolution of the source (width, height)
    fn native_size(&self) -> (u32, u32);

    /// Frame currently shown, if any
    fn current_frame(&self) -> Option<RawFrame>;
}

/// Surface that shows a live camera session
pub struct VideoPreview {
    session: Option<CaptureSession>,
    playing: bool,
    ready_timeout: Duration,
}

impl VideoPreview {
    pub fn new(ready_timeout: Duration) -> Self {
        Self {
            session: None,
            playing: false,
            ready_timeout,
        }
    }

    /// Attach a session; playback must be started again
    pub fn bind(&mut self, session: CaptureSession) {
        debug!("Binding session {} to preview", session.id());
        self.session = Some(session);
        self.playing = false;
    }

    /// Detach the current session without stopping it
    pub fn unbind(&mut self) -> Option<CaptureSession> {
        self.playing = false;
        self.session.take()
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Wait until the bound session has produced its first frame
    pub async fn wait_until_ready(&self) -> Result<(), CaptureError> {
        let session = self
            .session
            .as_ref()
            .ok_or(CaptureError::NoActivePreview)?;

        let wait = async {
            loop {
                if !session.is_live() {
                    return Err(CaptureError::playback_failed("camera stream ended"));
                }
                if session.latest_frame().is_some() {
                    return Ok(());
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(self.ready_timeout, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Preview did not receive a frame within {:?}",
                    self.ready_timeout
                );
                Err(CaptureError::playback_failed(
                    "camera did not deliver any video",
                ))
            }
        }
    }

    /// Start showing frames from the bound session
    pub fn play(&mut self) -> Result<(), CaptureError> {
        match &self.session {
            Some(session) if session.is_live() => {
                self.playing = true;
                Ok(())
            }
            Some(_) => Err(CaptureError::playback_failed("camera stream is not live")),
            None => Err(CaptureError::NoActivePreview),
        }
    }

    /// The preview as a frame source, while it is playing
    pub fn frame_source(&self) -> Option<&dyn FrameSource> {
        if self.playing && self.session.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl FrameSource for VideoPreview {
    fn native_size(&self) -> (u32, u32) {
        self.session
            .as_ref()
            .map(|s| {
                let settings = s.settings();
                (settings.width, settings.height)
            })
            .unwrap_or((0, 0))
    }

    fn current_frame(&self) -> Option<RawFrame> {
        self.session.as_ref().and_then(|s| s.latest_frame())
    }
}
