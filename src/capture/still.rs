use crate::error::CaptureError;
use crate::media::RawFrame;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Where a gallery image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    Import { file_name: String },
}

/// Encoded still image. Immutable once created; clones share the payload.
#[derive(Clone)]
pub struct CapturedImage {
    id: Uuid,
    mime_type: &'static str,
    bytes: Arc<[u8]>,
    origin: ImageOrigin,
    created_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(mime_type: &'static str, bytes: Vec<u8>, origin: ImageOrigin) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type,
            bytes: Arc::from(bytes),
            origin,
            created_at: Utc::now(),
        }
    }

    /// Build an image from file contents, rejecting anything that is not an image
    pub fn from_file_bytes(file_name: String, bytes: Vec<u8>) -> Option<Self> {
        let mime_type = sniff_mime_type(&bytes)?;
        Some(Self::new(mime_type, bytes, ImageOrigin::Import { file_name }))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `data:<mime>;base64,<payload>` rendering of the image
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl PartialEq for CapturedImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapturedImage {}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("id", &self.id)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("origin", &self.origin)
            .finish()
    }
}

/// Render a frame into an RGB buffer of `size` and encode it as JPEG
pub(crate) fn encode_jpeg(
    frame: RawFrame,
    size: (u32, u32),
    quality: u8,
) -> Result<Vec<u8>, CaptureError> {
    let (width, height) = size;
    if width == 0 || height == 0 {
        return Err(CaptureError::capture_failed("preview has no video dimensions"));
    }
    if (frame.width, frame.height) != size {
        return Err(CaptureError::capture_failed(format!(
            "frame is {}x{} but preview is {}x{}",
            frame.width, frame.height, width, height
        )));
    }

    let pixels = Arc::try_unwrap(frame.data).unwrap_or_else(|shared| (*shared).clone());
    let buffer = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| CaptureError::capture_failed("could not create the image buffer"))?;

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode(buffer.as_raw(), width, height, image::ColorType::Rgb8)
        .map_err(|e| CaptureError::capture_failed(e.to_string()))?;

    Ok(encoded)
}

/// MIME type of an encoded image, detected from its leading bytes
pub(crate) fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => return None,
    };
    Some(mime)
}
