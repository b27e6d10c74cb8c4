use super::backend::{MediaDevices, MediaStream};
use super::types::{
    DeviceInfo, DeviceKind, FacingMode, RawFrame, StreamConstraints, TrackSettings,
};
use crate::error::PlatformError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Largest resolution the synthetic cameras accept
const MAX_WIDTH: u32 = 3840;
const MAX_HEIGHT: u32 = 2160;

#[derive(Default)]
struct Accounting {
    live: AtomicUsize,
    peak_live: AtomicUsize,
    opened: AtomicUsize,
}

/// Test-pattern cameras used when no hardware backend is compiled in.
///
/// Each facing direction behaves like a physical device that can only be
/// opened once at a time. Failures can be queued to exercise error paths.
pub struct SyntheticDevices {
    devices: Vec<DeviceInfo>,
    report_facing: bool,
    stall_frames: bool,
    startup_delay: Duration,
    enumerate_error: Mutex<Option<PlatformError>>,
    queued_failures: Mutex<VecDeque<PlatformError>>,
    facing_failures: Mutex<Vec<(FacingMode, PlatformError)>>,
    requests: Mutex<Vec<StreamConstraints>>,
    in_use: Arc<Mutex<HashSet<FacingMode>>>,
    accounting: Arc<Accounting>,
}

impl SyntheticDevices {
    /// Front and back synthetic cameras
    pub fn new() -> Self {
        Self::with_devices(vec![
            DeviceInfo {
                id: "synthetic-back".to_string(),
                label: "Synthetic back camera".to_string(),
                kind: DeviceKind::VideoInput,
                facing: Some(FacingMode::Back),
            },
            DeviceInfo {
                id: "synthetic-front".to_string(),
                label: "Synthetic front camera".to_string(),
                kind: DeviceKind::VideoInput,
                facing: Some(FacingMode::Front),
            },
            DeviceInfo {
                id: "synthetic-mic".to_string(),
                label: "Synthetic microphone".to_string(),
                kind: DeviceKind::AudioInput,
                facing: None,
            },
        ])
    }

    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            report_facing: true,
            stall_frames: false,
            startup_delay: Duration::ZERO,
            enumerate_error: Mutex::new(None),
            queued_failures: Mutex::new(VecDeque::new()),
            facing_failures: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            in_use: Arc::new(Mutex::new(HashSet::new())),
            accounting: Arc::new(Accounting::default()),
        }
    }

    /// Streams do not report their facing direction in track settings
    pub fn without_facing_reports(mut self) -> Self {
        self.report_facing = false;
        self
    }

    /// Streams open but never deliver a frame
    pub fn with_stalled_frames(mut self) -> Self {
        self.stall_frames = true;
        self
    }

    /// Streams deliver their first frame only after `delay`
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Fail the next stream request with `error`
    pub fn fail_next(&self, error: PlatformError) {
        self.queued_failures.lock().push_back(error);
    }

    /// Fail every request for `facing` with `error`
    pub fn fail_facing(&self, facing: FacingMode, error: PlatformError) {
        self.facing_failures.lock().push((facing, error));
    }

    /// Fail device enumeration with `error`
    pub fn fail_enumeration(&self, error: PlatformError) {
        *self.enumerate_error.lock() = Some(error);
    }

    /// Constraints of every stream request received so far
    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.requests.lock().clone()
    }

    /// Streams currently open
    pub fn live_streams(&self) -> usize {
        self.accounting.live.load(Ordering::SeqCst)
    }

    /// Highest number of streams that were open at the same time
    pub fn peak_live_streams(&self) -> usize {
        self.accounting.peak_live.load(Ordering::SeqCst)
    }

    /// Streams successfully opened over the lifetime of the backend
    pub fn opened_streams(&self) -> usize {
        self.accounting.opened.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, facing: FacingMode) -> Option<PlatformError> {
        if let Some(err) = self.queued_failures.lock().pop_front() {
            return Some(err);
        }
        self.facing_failures
            .lock()
            .iter()
            .find(|(f, _)| *f == facing)
            .map(|(_, err)| err.clone())
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, PlatformError> {
        if let Some(err) = self.enumerate_error.lock().clone() {
            return Err(err);
        }
        Ok(self.devices.clone())
    }

    async fn get_user_media(
        &self,
        constraints: StreamConstraints,
    ) -> Result<Arc<dyn MediaStream>, PlatformError> {
        self.requests.lock().push(constraints);
        debug!("Synthetic stream requested: {:?}", constraints);

        if let Some(err) = self.injected_failure(constraints.facing) {
            debug!("Injected failure for synthetic stream request: {}", err);
            return Err(err);
        }

        let has_camera = self.devices.iter().any(|d| {
            d.kind == DeviceKind::VideoInput
                && d.facing.map_or(true, |facing| facing == constraints.facing)
        });
        if !has_camera {
            return Err(PlatformError::NotFound);
        }

        let (width, height) = (constraints.resolution.width, constraints.resolution.height);
        if width == 0 || width > MAX_WIDTH {
            return Err(PlatformError::Overconstrained {
                constraint: "width".to_string(),
            });
        }
        if height == 0 || height > MAX_HEIGHT {
            return Err(PlatformError::Overconstrained {
                constraint: "height".to_string(),
            });
        }

        if !self.in_use.lock().insert(constraints.facing) {
            return Err(PlatformError::NotReadable);
        }

        let live = self.accounting.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.accounting.peak_live.fetch_max(live, Ordering::SeqCst);
        self.accounting.opened.fetch_add(1, Ordering::SeqCst);

        info!(
            "Opened synthetic {} camera ({}x{})",
            constraints.facing, width, height
        );

        Ok(Arc::new(SyntheticStream {
            facing: constraints.facing,
            settings: TrackSettings {
                facing: self.report_facing.then_some(constraints.facing),
                width,
                height,
                frame_rate: constraints.frame_rate,
            },
            opened_at: Instant::now(),
            startup_delay: self.startup_delay,
            stall_frames: self.stall_frames,
            frame_counter: AtomicU64::new(0),
            live: AtomicBool::new(true),
            in_use: Arc::clone(&self.in_use),
            accounting: Arc::clone(&self.accounting),
        }))
    }
}

struct SyntheticStream {
    facing: FacingMode,
    settings: TrackSettings,
    opened_at: Instant,
    startup_delay: Duration,
    stall_frames: bool,
    frame_counter: AtomicU64,
    live: AtomicBool,
    in_use: Arc<Mutex<HashSet<FacingMode>>>,
    accounting: Arc<Accounting>,
}

impl SyntheticStream {
    fn render(&self, frame_id: u64) -> RawFrame {
        let (width, height) = (self.settings.width, self.settings.height);
        let shift = (frame_id % 256) as u32;
        let blue = match self.facing {
            FacingMode::Front => 0x40,
            FacingMode::Back => 0xC0,
        };

        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * 255 / width.max(1) + shift) % 256) as u8);
                data.push(((y * 255 / height.max(1) + shift) % 256) as u8);
                data.push(blue);
            }
        }

        RawFrame::new(width, height, data)
    }
}

impl MediaStream for SyntheticStream {
    fn settings(&self) -> TrackSettings {
        self.settings
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.in_use.lock().remove(&self.facing);
            self.accounting.live.fetch_sub(1, Ordering::SeqCst);
            info!("Closed synthetic {} camera", self.facing);
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn latest_frame(&self) -> Option<RawFrame> {
        if !self.is_live() || self.stall_frames {
            return None;
        }
        if self.opened_at.elapsed() < self.startup_delay {
            return None;
        }

        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        trace!("Generated synthetic frame {} ({})", frame_id, self.facing);
        Some(self.render(frame_id))
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}
