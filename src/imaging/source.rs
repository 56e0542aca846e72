//! Encoded image bytes as uploaded by the user.
//!
//! An [`ImageSource`] is the opaque pixel source a slot points at: the
//! original file bytes, shared by reference. Cloning is cheap (an `Arc`
//! bump), so the library, the slot arrays and export snapshots can all hold
//! the same upload without copying it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("not a base64 data URI: {0}")]
    InvalidDataUri(String),
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image data is empty")]
    Empty,
}

#[derive(Clone)]
pub struct ImageSource {
    bytes: Arc<[u8]>,
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, SourceError> {
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    /// Parse a `data:<mime>;base64,<payload>` URI as produced by browser file readers.
    pub fn from_data_uri(uri: &str) -> Result<Self, SourceError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| SourceError::InvalidDataUri(truncate(uri)))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SourceError::InvalidDataUri(truncate(uri)))?;
        if !header.ends_with(";base64") {
            return Err(SourceError::InvalidDataUri(truncate(uri)));
        }
        Self::from_bytes(STANDARD.decode(payload.trim())?)
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

    /// Container format sniffed from the magic bytes, if recognised.
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    pub fn mime_type(&self) -> &'static str {
        match self.format() {
            Some(ImageFormat::Png) => "image/png",
            Some(ImageFormat::Jpeg) => "image/jpeg",
            Some(ImageFormat::WebP) => "image/webp",
            Some(ImageFormat::Tiff) => "image/tiff",
            Some(ImageFormat::Gif) => "image/gif",
            _ => "application/octet-stream",
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }

    /// SHA-256 of the bytes, hex encoded. Two uploads of the same file share a digest.
    pub fn content_hash(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("mime", &self.mime_type())
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(32).collect()
}
