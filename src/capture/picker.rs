use crate::error::CaptureError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions offered by the picker (the `image/*` family)
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "ico", "avif",
];

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// User-mediated selection of image files
#[async_trait]
pub trait FilePicker: Send + Sync {
    /// Prompt for image files (multi-select). `None` when the user cancels.
    async fn pick_images(&self) -> Result<Option<Vec<PathBuf>>, CaptureError>;
}

/// Picker that answers every prompt with a fixed list of files
#[derive(Debug, Clone, Default)]
pub struct PathListPicker {
    paths: Option<Vec<PathBuf>>,
}

impl PathListPicker {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: Some(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Picker whose prompt is always dismissed
    pub fn cancelled() -> Self {
        Self { paths: None }
    }
}

#[async_trait]
impl FilePicker for PathListPicker {
    async fn pick_images(&self) -> Result<Option<Vec<PathBuf>>, CaptureError> {
        let Some(paths) = &self.paths else {
            debug!("File selection cancelled");
            return Ok(None);
        };

        let selected: Vec<PathBuf> = paths
            .iter()
            .filter(|p| has_image_extension(p))
            .cloned()
            .collect();

        debug!("Selected {} of {} offered files", selected.len(), paths.len());
        Ok(Some(selected))
    }
}

/// Native file dialog
#[cfg(feature = "dialog")]
#[derive(Debug, Clone, Default)]
pub struct DialogPicker;

#[cfg(feature = "dialog")]
#[async_trait]
impl FilePicker for DialogPicker {
    async fn pick_images(&self) -> Result<Option<Vec<PathBuf>>, CaptureError> {
        let handles = rfd::AsyncFileDialog::new()
            .set_title("Select images")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
            .await;

        Ok(handles.map(|files| {
            files
                .into_iter()
                .map(|handle| handle.path().to_path_buf())
                .collect()
        }))
    }
}
