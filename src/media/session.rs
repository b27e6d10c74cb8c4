use super::backend::MediaStream;
use super::types::{FacingMode, RawFrame, StreamConstraints, TrackSettings};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

struct SessionInner {
    id: Uuid,
    constraints: StreamConstraints,
    stream: Arc<dyn MediaStream>,
    stopped: AtomicBool,
}

/// Handle to an open camera stream.
///
/// Clones share the same stream; stopping any clone stops them all.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<SessionInner>,
}

impl CaptureSession {
    pub fn new(constraints: StreamConstraints, stream: Arc<dyn MediaStream>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                constraints,
                stream,
                stopped: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn settings(&self) -> TrackSettings {
        self.inner.stream.settings()
    }

    /// Facing direction reported by the video track, if the platform knows it
    pub fn facing(&self) -> Option<FacingMode> {
        self.settings().facing
    }

    pub fn is_live(&self) -> bool {
        !self.inner.stopped.load(Ordering::Acquire) && self.inner.stream.is_live()
    }

    pub fn latest_frame(&self) -> Option<RawFrame> {
        if self.inner.stopped.load(Ordering::Acquire) {
            return None;
        }
        self.inner.stream.latest_frame()
    }

    /// Stop all tracks. Safe to call more than once.
    pub fn stop(&self) {
        if !self.inner.stopped.swap(true, Ordering::AcqRel) {
            debug!("Stopping capture session {}", self.inner.id);
            self.inner.stream.stop();
        }
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.inner.id)
            .field("constraints", &self.inner.constraints)
            .field("stopped", &self.inner.stopped.load(Ordering::Relaxed))
            .finish()
    }
}
