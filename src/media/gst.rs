use super::backend::{MediaDevices, MediaStream};
use super::types::{
    DeviceInfo, DeviceKind, FacingMode, RawFrame, StreamConstraints, TrackSettings,
};
use crate::config::CameraConfig;
use crate::error::PlatformError;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// V4L2 cameras driven through GStreamer
pub struct GstMediaDevices {
    front_device: u32,
    back_device: u32,
}

impl GstMediaDevices {
    pub fn new(config: &CameraConfig) -> Result<Self, PlatformError> {
        gstreamer::init()
            .map_err(|e| PlatformError::other(format!("Failed to initialize GStreamer: {}", e)))?;

        info!(
            "GStreamer camera backend ready (front=/dev/video{}, back=/dev/video{})",
            config.front_device, config.back_device
        );

        Ok(Self {
            front_device: config.front_device,
            back_device: config.back_device,
        })
    }

    fn device_index(&self, facing: FacingMode) -> u32 {
        match facing {
            FacingMode::Front => self.front_device,
            FacingMode::Back => self.back_device,
        }
    }

    fn facing_for(&self, index: u32) -> Option<FacingMode> {
        if index == self.front_device {
            Some(FacingMode::Front)
        } else if index == self.back_device {
            Some(FacingMode::Back)
        } else {
            None
        }
    }

    fn build_pipeline_string(device_index: u32, constraints: &StreamConstraints) -> String {
        let mut caps = format!(
            "video/x-raw,format=RGB,width={},height={}",
            constraints.resolution.width, constraints.resolution.height
        );
        if let Some(fps) = constraints.frame_rate {
            caps.push_str(&format!(",framerate={}/1", fps));
        }

        format!(
            "v4l2src device=/dev/video{} ! \
             videoconvert ! videoscale ! videorate ! {} ! \
             appsink name=sink sync=false max-buffers=1 drop=true emit-signals=false",
            device_index, caps
        )
    }
}

#[async_trait]
impl MediaDevices for GstMediaDevices {
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, PlatformError> {
        // Every /dev/videoN node is a candidate camera
        let mut entries = tokio::fs::read_dir("/dev")
            .await
            .map_err(|e| PlatformError::from_io(&e))?;

        let mut devices = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PlatformError::from_io(&e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(index) = name
                .strip_prefix("video")
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };

            devices.push(DeviceInfo {
                id: format!("/dev/{}", name),
                label: format!("V4L2 device {}", index),
                kind: DeviceKind::VideoInput,
                facing: self.facing_for(index),
            });
        }

        devices.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Enumerated {} V4L2 devices", devices.len());
        Ok(devices)
    }

    async fn get_user_media(
        &self,
        constraints: StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, PlatformError> {
        let device_index = self.device_index(constraints.facing);
        let device_path = format!("/dev/video{}", device_index);

        // Probe the node first so permission and busy errors keep their errno
        let node = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&device_path)
            .await
            .map_err(|e| {
                debug!("Opening {} failed: {}", device_path, e);
                PlatformError::from_io(&e)
            })?;
        drop(node);

        // Create pipeline
        let pipeline_desc = Self::build_pipeline_string(device_index, &constraints);
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| PlatformError::other(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| PlatformError::other("Failed to downcast to Pipeline"))?;

        // Get appsink element
        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| PlatformError::other("Pipeline has no appsink"))?
            .downcast::<AppSink>()
            .map_err(|_| PlatformError::other("Failed to downcast to AppSink"))?;

        let latest: Arc<Mutex<Option<RawFrame>>> = Arc::new(Mutex::new(None));
        let sink_latest = Arc::clone(&latest);

        // Keep only the newest frame, the preview polls it
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    match sample_to_frame(&sample) {
                        Ok(frame) => *sink_latest.lock() = Some(frame),
                        Err(e) => error!("Error processing GStreamer sample: {}", e),
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        // Start pipeline
        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            error!("Failed to start GStreamer pipeline: {}", e);
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(PlatformError::NotReadable);
        }

        Ok(Arc::new(GstStream {
            pipeline,
            latest,
            live: AtomicBool::new(true),
            settings: TrackSettings {
                facing: Some(constraints.facing),
                width: constraints.resolution.width,
                height: constraints.resolution.height,
                frame_rate: constraints.frame_rate,
            },
        }))
    }
}

fn sample_to_frame(sample: &gstreamer::Sample) -> Result<RawFrame, String> {
    let buffer = sample.buffer().ok_or("No buffer in sample")?;
    let caps = sample.caps().ok_or("No caps in sample")?;
    let info =
        VideoInfo::from_caps(caps).map_err(|e| format!("Failed to get video info: {}", e))?;

    let map = buffer
        .map_readable()
        .map_err(|e| format!("Failed to map buffer: {}", e))?;

    let width = info.width();
    let height = info.height();
    let row_len = width as usize * 3;
    let stride = info.stride()[0] as usize;

    // Rows may be padded, copy them out tightly packed
    let data = map.as_slice();
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_len;
        if end > data.len() {
            return Err("Truncated video buffer".to_string());
        }
        pixels.extend_from_slice(&data[start..end]);
    }

    trace!("Captured RGB frame ({}x{})", width, height);
    Ok(RawFrame::new(width, height, pixels))
}

struct GstStream {
    pipeline: Pipeline,
    latest: Arc<Mutex<Option<RawFrame>>>,
    live: AtomicBool,
    settings: TrackSettings,
}

impl MediaStream for GstStream {
    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            let _ = self.pipeline.set_state(gstreamer::State::Null);
            self.latest.lock().take();
            info!("GStreamer camera pipeline stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn latest_frame(&self) -> Option<RawFrame> {
        self.latest.lock().clone()
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        self.stop();
    }
}
