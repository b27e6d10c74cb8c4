use super::types::{DeviceInfo, RawFrame, StreamConstraints, TrackSettings};
use crate::error::PlatformError;
use async_trait::async_trait;
use std::sync::Arc;

/// Device-media subsystem of the host platform
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// List every capture and playback device known to the platform
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, PlatformError>;

    /// Open a live video stream matching the constraints
    async fn get_user_media(
        &self,
        constraints: StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, PlatformError>;
}

/// A live stream of video frames owned by the platform
pub trait MediaStream: Send + Sync {
    /// Settings of the stream's video track
    fn settings(&self) -> TrackSettings;

    /// Stop every track of the stream and release the device
    fn stop(&self);

    /// Whether any track is still delivering frames
    fn is_live(&self) -> bool;

    /// Most recent frame, if one has arrived
    fn latest_frame(&self) -> Option<RawFrame>;
}
