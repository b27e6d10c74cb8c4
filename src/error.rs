use thiserror::Error;

#[derive(Error, Debug)]
pub enum CamGalleryError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
}

pub type Result<T> = std::result::Result<T, CamGalleryError>;

/// Errors surfaced by the capture service and the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission to access the camera was denied. Please allow camera access.")]
    PermissionDenied,

    #[error("No camera was found on this device.")]
    DeviceNotFound,

    #[error("The camera is being used by another application.")]
    DeviceBusy,

    #[error("The camera cannot satisfy the requested video constraints ({constraint}).")]
    ConstraintsUnsatisfiable { constraint: String },

    #[error("The camera request was cancelled.")]
    RequestAborted,

    #[error("Error accessing the camera: {name}")]
    UnknownDevice { name: String },

    #[error("No camera preview is available")]
    NoActivePreview,

    #[error("Could not capture the image: {details}")]
    CaptureFailed { details: String },

    #[error("Could not load images from the gallery: {details}")]
    GalleryImportFailed { details: String },

    #[error("Gallery index {index} is out of range (gallery has {len} images)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Could not start video playback: {details}")]
    PlaybackFailed { details: String },
}

impl CaptureError {
    pub fn capture_failed<S: Into<String>>(details: S) -> Self {
        Self::CaptureFailed {
            details: details.into(),
        }
    }

    pub fn import_failed<S: Into<String>>(details: S) -> Self {
        Self::GalleryImportFailed {
            details: details.into(),
        }
    }

    pub fn playback_failed<S: Into<String>>(details: S) -> Self {
        Self::PlaybackFailed {
            details: details.into(),
        }
    }

    /// Text shown to the user in place of the preview.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether retrying the same action can reasonably succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            CaptureError::DeviceNotFound | CaptureError::IndexOutOfRange { .. }
        )
    }
}

/// Raw failure reported by the media platform before translation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("NotAllowedError")]
    NotAllowed,

    #[error("NotFoundError")]
    NotFound,

    #[error("NotReadableError")]
    NotReadable,

    #[error("OverconstrainedError: {constraint}")]
    Overconstrained { constraint: String },

    #[error("AbortError")]
    Abort,

    #[error("{name}")]
    Other { name: String },
}

impl PlatformError {
    pub fn other<S: Into<String>>(name: S) -> Self {
        Self::Other { name: name.into() }
    }

    /// Classify an OS error raised while opening a capture device node.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EACCES) | Some(libc::EPERM) => PlatformError::NotAllowed,
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) => {
                PlatformError::NotFound
            }
            Some(libc::EBUSY) => PlatformError::NotReadable,
            Some(libc::EINTR) => PlatformError::Abort,
            _ => PlatformError::other(err.to_string()),
        }
    }
}

impl From<PlatformError> for CaptureError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotAllowed => CaptureError::PermissionDenied,
            PlatformError::NotFound => CaptureError::DeviceNotFound,
            PlatformError::NotReadable => CaptureError::DeviceBusy,
            PlatformError::Overconstrained { constraint } => {
                CaptureError::ConstraintsUnsatisfiable { constraint }
            }
            PlatformError::Abort => CaptureError::RequestAborted,
            PlatformError::Other { name } => CaptureError::UnknownDevice { name },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_errors_map_to_distinct_kinds() {
        assert_eq!(
            CaptureError::from(PlatformError::NotAllowed),
            CaptureError::PermissionDenied
        );
        assert_eq!(
            CaptureError::from(PlatformError::NotFound),
            CaptureError::DeviceNotFound
        );
        assert_eq!(
            CaptureError::from(PlatformError::NotReadable),
            CaptureError::DeviceBusy
        );
        assert_eq!(
            CaptureError::from(PlatformError::Abort),
            CaptureError::RequestAborted
        );
        assert_eq!(
            CaptureError::from(PlatformError::Overconstrained {
                constraint: "width".to_string()
            }),
            CaptureError::ConstraintsUnsatisfiable {
                constraint: "width".to_string()
            }
        );
        assert_eq!(
            CaptureError::from(PlatformError::other("SecurityError")),
            CaptureError::UnknownDevice {
                name: "SecurityError".to_string()
            }
        );
    }

    #[test]
    fn test_user_messages_are_readable() {
        let msg = CaptureError::PermissionDenied.user_message();
        assert!(msg.contains("denied"));

        let msg = CaptureError::UnknownDevice {
            name: "SecurityError".to_string(),
        }
        .user_message();
        assert!(msg.ends_with("SecurityError"));
    }

    #[test]
    fn test_io_errors_classified() {
        let denied = std::io::Error::from_raw_os_error(libc::EACCES);
        assert_eq!(PlatformError::from_io(&denied), PlatformError::NotAllowed);

        let busy = std::io::Error::from_raw_os_error(libc::EBUSY);
        assert_eq!(PlatformError::from_io(&busy), PlatformError::NotReadable);

        let missing = std::io::Error::from_raw_os_error(libc::ENOENT);
        assert_eq!(PlatformError::from_io(&missing), PlatformError::NotFound);
    }

    #[test]
    fn test_recoverability() {
        assert!(CaptureError::DeviceBusy.is_recoverable());
        assert!(!CaptureError::DeviceNotFound.is_recoverable());
        assert!(!CaptureError::IndexOutOfRange { index: 3, len: 1 }.is_recoverable());
    }
}
