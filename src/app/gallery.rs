use crate::capture::CapturedImage;
use crate::error::CaptureError;

/// In-memory images, most recent first
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    images: Vec<CapturedImage>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, image: CapturedImage) {
        self.images.insert(0, image);
    }

    /// Put `images` in front of the existing entries, keeping their order
    pub fn prepend_all(&mut self, images: Vec<CapturedImage>) {
        self.images.splice(0..0, images);
    }

    pub fn remove(&mut self, index: usize) -> Result<CapturedImage, CaptureError> {
        if index >= self.images.len() {
            return Err(CaptureError::IndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        Ok(self.images.remove(index))
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn get(&self, index: usize) -> Option<&CapturedImage> {
        self.images.get(index)
    }

    pub fn position(&self, image: &CapturedImage) -> Option<usize> {
        self.images.iter().position(|i| i == image)
    }

    pub fn as_slice(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
