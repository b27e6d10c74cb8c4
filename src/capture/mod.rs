mod picker;
mod service;
mod still;

pub use still::{CapturedImage, ImageOrigin};
#[cfg(feature = "dialog")]
pub use picker::DialogPicker;
pub use picker::{has_image_extension, FilePicker, PathListPicker, IMAGE_EXTENSIONS};
pub use service::CaptureService;
