//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations exporters need:
//! identify, decode and cover-fit. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests swap in a
//! recording mock.

use super::params::CoverParams;
use super::source::ImageSource;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image backends.
///
/// Implementations must be `Sync`: exporters decode every image of a page in
/// parallel on the rayon pool.
pub trait ImageBackend: Sync {
    /// Read dimensions without a full decode where the format allows it.
    fn identify(&self, source: &ImageSource) -> Result<Dimensions, BackendError>;

    /// Decode the encoded bytes into pixels.
    fn decode(&self, source: &ImageSource) -> Result<DynamicImage, BackendError>;

    /// Scale to cover `params` and center-crop the overflow.
    fn cover(&self, image: &DynamicImage, params: &CoverParams) -> Result<RgbaImage, BackendError>;
}
