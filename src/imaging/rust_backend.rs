//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Cover resize | `DynamicImage::resize_exact` + `crop_imm`, Lanczos3 |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_fill_dimensions, center_crop_offset};
use super::params::CoverParams;
use super::source::ImageSource;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::io::Cursor;

/// Backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &ImageSource) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source.bytes()))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("Failed to sniff format: {e}")))
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &ImageSource) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(source)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, source: &ImageSource) -> Result<DynamicImage, BackendError> {
        let img = reader(source)?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(BackendError::Decode("image has zero area".into()));
        }
        Ok(img)
    }

    fn cover(&self, image: &DynamicImage, params: &CoverParams) -> Result<RgbaImage, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Invalid cover target {}x{}",
                params.width, params.height
            )));
        }
        let target = (params.width, params.height);
        let filled_dims = calculate_fill_dimensions((image.width(), image.height()), target);
        let filled = image.resize_exact(filled_dims.0, filled_dims.1, params.filter);
        let (x, y) = center_crop_offset(filled_dims, target);
        Ok(filled.crop_imm(x, y, params.width, params.height).to_rgba8())
    }
}
