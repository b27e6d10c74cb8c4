mod backend;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod gst;
mod preview;
mod session;
mod synthetic;
mod types;

pub use backend::{MediaDevices, MediaStream};
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use gst::GstMediaDevices;
pub use preview::{FrameSource, VideoPreview};
pub use session::CaptureSession;
pub use synthetic::SyntheticDevices;
pub use types::{
    DeviceInfo, DeviceKind, FacingMode, RawFrame, ResolutionHint, StreamConstraints,
    TrackSettings,
};
