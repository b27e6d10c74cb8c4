use super::*;
use crate::capture::{CaptureService, CapturedImage, ImageOrigin, PathListPicker};
use crate::config::CamGalleryConfig;
use crate::error::{CaptureError, PlatformError};
use crate::media::{FacingMode, SyntheticDevices};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn create_test_config() -> CamGalleryConfig {
    let mut config = CamGalleryConfig::default();
    config.camera.resolution = (32, 24);
    config.camera.preview_ready_timeout_ms = 200;
    config
}

fn create_controller_with(
    devices: Arc<SyntheticDevices>,
    picker: PathListPicker,
    config: &CamGalleryConfig,
) -> CaptureController {
    let service = CaptureService::new(devices, Arc::new(picker), config);
    CaptureController::new(service, config)
}

fn create_controller(devices: Arc<SyntheticDevices>) -> CaptureController {
    create_controller_with(devices, PathListPicker::cancelled(), &create_test_config())
}

fn sample_image(tag: u8) -> CapturedImage {
    CapturedImage::new("image/jpeg", vec![0xFF, 0xD8, tag], ImageOrigin::Camera)
}

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])).save(&path).unwrap();
    path
}

/// Controller whose gallery holds [a, b] and which is not capturing
fn controller_with_gallery(
    devices: Arc<SyntheticDevices>,
) -> (CaptureController, CapturedImage, CapturedImage) {
    let mut controller = create_controller(devices);
    let a = sample_image(1);
    let b = sample_image(2);
    controller.gallery.prepend_all(vec![a.clone(), b.clone()]);
    (controller, a, b)
}

#[tokio::test]
async fn test_controller_starts_idle() {
    let devices = Arc::new(SyntheticDevices::new());
    let controller = create_controller(Arc::clone(&devices));

    assert_eq!(controller.camera_state(), CameraState::Idle);
    assert!(controller.gallery().is_empty());
    assert!(controller.selected_image().is_none());
    assert!(devices.requests().is_empty());
}

#[tokio::test]
async fn test_init_probes_devices_without_starting() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.init().await;
    assert_eq!(controller.has_video_input(), Some(true));
    assert!(!controller.state().camera_active);
    assert_eq!(devices.opened_streams(), 0);

    let failing = Arc::new(SyntheticDevices::new());
    failing.fail_enumeration(PlatformError::NotAllowed);
    let mut controller = create_controller(failing);
    controller.init().await;
    assert_eq!(controller.has_video_input(), None);
    assert!(!controller.state().has_error());
}

#[tokio::test]
async fn test_start_camera_activates_preview() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;

    let state = controller.state();
    assert!(state.camera_active);
    assert!(!state.loading);
    assert!(state.permission_granted);
    assert!(state.error_message.is_empty());
    assert_eq!(controller.camera_state(), CameraState::Active);
    assert_eq!(devices.live_streams(), 1);
}

#[tokio::test]
async fn test_start_camera_when_active_is_noop() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    controller.start_camera().await;

    assert_eq!(devices.requests().len(), 1);
    assert_eq!(devices.live_streams(), 1);
}

#[tokio::test]
async fn test_start_camera_permission_denied() {
    let devices = Arc::new(SyntheticDevices::new());
    devices.fail_next(PlatformError::NotAllowed);
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;

    let state = controller.state();
    assert!(!state.camera_active);
    assert!(!state.loading);
    assert!(!state.permission_granted);
    assert_eq!(
        state.error_message,
        CaptureError::PermissionDenied.user_message()
    );
}

#[tokio::test]
async fn test_start_camera_playback_failure_releases_stream() {
    let devices = Arc::new(SyntheticDevices::new().with_stalled_frames());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;

    let state = controller.state();
    assert!(!state.camera_active);
    assert!(!state.loading);
    assert!(state.has_error());
    assert!(controller.session().is_none());
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_start_clears_previous_error() {
    let devices = Arc::new(SyntheticDevices::new());
    devices.fail_next(PlatformError::NotReadable);
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    assert!(controller.state().has_error());

    controller.start_camera().await;
    assert!(controller.state().camera_active);
    assert!(!controller.state().has_error());
}

#[tokio::test]
async fn test_start_stop_start_keeps_single_session() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    for _ in 0..3 {
        controller.start_camera().await;
        assert!(controller.state().camera_active);
        controller.stop_camera();
        assert!(!controller.state().camera_active);
    }

    assert_eq!(devices.opened_streams(), 3);
    assert_eq!(devices.peak_live_streams(), 1);
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_stop_camera_without_preview_is_noop() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.stop_camera();
    assert_eq!(controller.camera_state(), CameraState::Idle);
    assert_eq!(devices.opened_streams(), 0);
}

#[tokio::test]
async fn test_switch_camera_when_inactive_makes_no_call() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));
    let before = controller.snapshot();

    controller.switch_camera().await;

    assert_eq!(controller.snapshot(), before);
    assert!(devices.requests().is_empty());
}

#[tokio::test]
async fn test_switch_camera_changes_facing() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    controller.switch_camera().await;

    assert!(controller.state().camera_active);
    assert!(!controller.state().loading);
    assert_eq!(controller.facing(), FacingMode::Front);
    assert_eq!(
        controller.session().and_then(|s| s.facing()),
        Some(FacingMode::Front)
    );
    assert_eq!(devices.peak_live_streams(), 1);
}

#[tokio::test]
async fn test_start_after_switch_uses_configured_camera() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    controller.switch_camera().await;
    assert_eq!(controller.facing(), FacingMode::Front);
    controller.stop_camera();
    controller.start_camera().await;

    let requests = devices.requests();
    assert_eq!(requests.last().map(|c| c.facing), Some(FacingMode::Back));
    assert_eq!(controller.facing(), FacingMode::Back);
    assert!(controller.state().camera_active);
}

#[tokio::test]
async fn test_switch_camera_falls_back_silently() {
    let devices = Arc::new(SyntheticDevices::new());
    devices.fail_facing(FacingMode::Front, PlatformError::NotReadable);
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    controller.switch_camera().await;

    assert!(controller.state().camera_active);
    assert!(!controller.state().has_error());
    assert_eq!(controller.facing(), FacingMode::Back);
}

#[tokio::test]
async fn test_switch_camera_failure_sets_generic_message() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));
    controller.start_camera().await;

    devices.fail_facing(FacingMode::Front, PlatformError::NotReadable);
    devices.fail_facing(FacingMode::Back, PlatformError::NotReadable);
    controller.switch_camera().await;

    let state = controller.state();
    assert_eq!(state.error_message, "Could not switch camera");
    assert!(!state.loading);
    assert!(!state.camera_active);
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_capture_photo_when_inactive() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, a, b) = controller_with_gallery(devices);

    controller.capture_photo();

    assert!(controller.state().has_error());
    assert_eq!(controller.gallery(), &[a, b][..]);
    assert!(controller.last_capture().is_none());
}

#[tokio::test]
async fn test_capture_photo_prepends_to_gallery() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, a, b) = controller_with_gallery(Arc::clone(&devices));

    controller.start_camera().await;
    controller.capture_photo();

    let gallery = controller.gallery();
    assert_eq!(gallery.len(), 3);
    let c = gallery[0].clone();
    assert_eq!(gallery, &[c.clone(), a, b][..]);
    assert_eq!(controller.last_capture(), Some(&c));
    assert_eq!(c.mime_type(), "image/jpeg");

    // Capturing does not stop the preview
    assert!(controller.state().camera_active);
    assert_eq!(devices.live_streams(), 1);
}

#[tokio::test]
async fn test_capture_photo_auto_stop_policy() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut config = create_test_config();
    config.controller.auto_stop_after_capture = true;
    let mut controller =
        create_controller_with(Arc::clone(&devices), PathListPicker::cancelled(), &config);

    controller.start_camera().await;
    controller.capture_photo();

    assert_eq!(controller.gallery().len(), 1);
    assert!(!controller.state().camera_active);
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_load_from_gallery_prepends_and_selects_first() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write_png(dir.path(), "one.png"), write_png(dir.path(), "two.png")];
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller_with(
        Arc::clone(&devices),
        PathListPicker::new(paths),
        &create_test_config(),
    );
    let existing = sample_image(7);
    controller.gallery.prepend(existing.clone());

    controller.start_camera().await;
    controller.load_from_gallery().await;

    let gallery = controller.gallery();
    assert_eq!(gallery.len(), 3);
    assert_eq!(
        gallery[0].origin(),
        &ImageOrigin::Import {
            file_name: "one.png".to_string()
        }
    );
    assert_eq!(
        gallery[1].origin(),
        &ImageOrigin::Import {
            file_name: "two.png".to_string()
        }
    );
    assert_eq!(gallery[2], existing);
    assert_eq!(controller.selected_image(), Some(&gallery[0]));

    let state = controller.state();
    assert!(!state.camera_active);
    assert!(!state.loading);
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_load_from_gallery_respects_import_limit() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..8)
        .map(|i| write_png(dir.path(), &format!("p{}.png", i)))
        .collect();
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller =
        create_controller_with(devices, PathListPicker::new(paths), &create_test_config());

    controller.load_from_gallery().await;
    assert_eq!(controller.gallery().len(), 5);
}

#[tokio::test]
async fn test_load_from_gallery_unreadable_file_sets_error() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write_png(dir.path(), "good.png"), dir.path().join("missing.png")];
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller =
        create_controller_with(devices, PathListPicker::new(paths), &create_test_config());

    controller.load_from_gallery().await;

    let state = controller.state();
    assert!(state.has_error());
    assert!(state.error_message.contains("missing.png"));
    assert!(!state.loading);
    assert!(controller.gallery().is_empty());
    assert!(controller.selected_image().is_none());
}

#[tokio::test]
async fn test_load_from_gallery_cancelled_keeps_camera() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    controller.load_from_gallery().await;

    assert!(controller.gallery().is_empty());
    assert!(controller.selected_image().is_none());
    assert!(controller.state().camera_active);
    assert!(!controller.state().loading);
}

#[tokio::test]
async fn test_select_image_stops_camera() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, a, _b) = controller_with_gallery(Arc::clone(&devices));

    controller.start_camera().await;
    controller.select_image(a.clone());

    assert_eq!(controller.selected_image(), Some(&a));
    assert!(!controller.state().camera_active);
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_select_image_outside_gallery() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(devices);
    let loose = sample_image(3);

    controller.select_image(loose.clone());
    assert_eq!(controller.selected_image(), Some(&loose));
    assert!(controller.gallery().is_empty());
}

#[tokio::test]
async fn test_select_index() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, _a, b) = controller_with_gallery(devices);

    controller.select_index(1).unwrap();
    assert_eq!(controller.selected_image(), Some(&b));

    assert_eq!(
        controller.select_index(2),
        Err(CaptureError::IndexOutOfRange { index: 2, len: 2 })
    );
}

#[tokio::test]
async fn test_delete_selected_image_clears_selection() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, a, b) = controller_with_gallery(devices);

    controller.select_image(a.clone());
    let removed = controller.delete_image(0).unwrap();

    assert_eq!(removed, a);
    assert_eq!(controller.gallery(), &[b][..]);
    assert!(controller.selected_image().is_none());
}

#[tokio::test]
async fn test_delete_other_image_keeps_selection() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, _a, b) = controller_with_gallery(devices);

    controller.select_image(b.clone());
    controller.delete_image(0).unwrap();

    assert_eq!(controller.gallery(), &[b.clone()][..]);
    assert_eq!(controller.selected_image(), Some(&b));
}

#[tokio::test]
async fn test_delete_image_out_of_range() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, a, b) = controller_with_gallery(devices);

    let result = controller.delete_image(5);
    assert_eq!(result, Err(CaptureError::IndexOutOfRange { index: 5, len: 2 }));
    assert_eq!(controller.gallery(), &[a, b][..]);
}

#[tokio::test]
async fn test_clear_gallery_resets_everything() {
    let devices = Arc::new(SyntheticDevices::new());
    let (mut controller, a, _b) = controller_with_gallery(Arc::clone(&devices));

    controller.start_camera().await;
    controller.capture_photo();
    controller.select_image(a);
    controller.clear_gallery();

    assert!(controller.gallery().is_empty());
    assert!(controller.selected_image().is_none());
    assert!(controller.last_capture().is_none());

    controller.clear_gallery();
    assert!(controller.gallery().is_empty());
}

#[tokio::test]
async fn test_dispose_releases_camera() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(Arc::clone(&devices));

    controller.start_camera().await;
    controller.dispose();

    assert!(!controller.state().camera_active);
    assert_eq!(devices.live_streams(), 0);

    controller.dispose();
}

#[tokio::test]
async fn test_drop_releases_camera() {
    let devices = Arc::new(SyntheticDevices::new());
    {
        let mut controller = create_controller(Arc::clone(&devices));
        controller.start_camera().await;
        assert_eq!(devices.live_streams(), 1);
    }
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_subscribers_see_latest_snapshot() {
    let devices = Arc::new(SyntheticDevices::new());
    let mut controller = create_controller(devices);
    let mut updates = controller.subscribe();

    controller.start_camera().await;
    tokio::time::timeout(Duration::from_secs(1), updates.changed())
        .await
        .unwrap()
        .unwrap();

    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.camera_state, CameraState::Active);
    assert!(snapshot.state.permission_granted);

    controller.capture_photo();
    assert_eq!(updates.borrow().gallery_len, 1);
}

#[test]
fn test_camera_state_mapping() {
    let mut state = UiState::default();
    assert_eq!(state.camera_state(), CameraState::Idle);

    state.loading = true;
    assert_eq!(state.camera_state(), CameraState::Starting);

    state.camera_active = true;
    assert_eq!(state.camera_state(), CameraState::Stopping);

    state.loading = false;
    assert_eq!(state.camera_state(), CameraState::Active);
}

#[test]
fn test_gallery_ordering() {
    let mut gallery = Gallery::new();
    let (a, b, c) = (sample_image(1), sample_image(2), sample_image(3));

    gallery.prepend(c.clone());
    gallery.prepend_all(vec![a.clone(), b.clone()]);
    assert_eq!(gallery.as_slice(), &[a.clone(), b.clone(), c.clone()][..]);
    assert_eq!(gallery.position(&b), Some(1));

    // Duplicates are allowed
    gallery.prepend(a.clone());
    assert_eq!(gallery.len(), 4);
    assert_eq!(gallery.get(0), Some(&a));
}
