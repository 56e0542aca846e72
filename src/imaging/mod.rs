//! Image handling in pure Rust, with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Source bytes** | [`ImageSource`]: shared upload bytes, data URIs, SHA-256 identity |
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image::load_from_memory` via [`RustBackend`] |
//! | **Cover fit** | fill-resize (Lanczos3) + center crop |
//! | **Batch decode** | rayon `par_iter` join over every image an export needs |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for cover-fit math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod source;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{Decoded, decode_all, identify_all};
pub use params::CoverParams;
pub use rust_backend::RustBackend;
pub use source::{ImageSource, SourceError};
