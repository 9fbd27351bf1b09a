//! Uploaded images
//!
//! Uploads are checked to be real JPEG or PNG images before they are handed
//! to the generative service. The decoded pixels are not kept; the service
//! receives the original bytes.

use std::path::Path;

use image::{GenericImageView, ImageFormat};

use crate::{Error, Result};

/// A validated image upload
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    data: Vec<u8>,
    mime_type: &'static str,
    filename: Option<String>,
    width: u32,
    height: u32,
}

impl ImageUpload {
    /// Validate and decode raw upload bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Image` for empty data, formats other than JPEG/PNG,
    /// or data that fails to decode
    pub fn from_bytes(data: Vec<u8>, filename: Option<String>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Image("empty upload".to_string()));
        }

        let format = image::guess_format(&data)
            .map_err(|e| Error::Image(format!("unrecognized image data: {e}")))?;

        let mime_type = match format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            other => {
                return Err(Error::Image(format!(
                    "unsupported image format {other:?}, expected JPEG or PNG"
                )));
            }
        };

        let decoded = image::load_from_memory_with_format(&data, format)
            .map_err(|e| Error::Image(format!("failed to decode image: {e}")))?;
        let (width, height) = decoded.dimensions();

        tracing::debug!(
            mime_type,
            width,
            height,
            bytes = data.len(),
            "image upload decoded"
        );

        Ok(Self {
            data,
            mime_type,
            filename,
            width,
            height,
        })
    }

    /// Read and validate an image file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid image
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self::from_bytes(data, filename)
    }

    /// Original file bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Pixel dimensions as `(width, height)`
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("mime_type", &self.mime_type)
            .field("filename", &self.filename)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}
