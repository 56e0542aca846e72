//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. They sit between the
//! exporters (which decide the cell size) and the [`backend`](super::backend)
//! (which does the pixel work).

use image::imageops::FilterType;

/// Cover-fit target: the output is exactly `width × height`, the source is
/// scaled until it covers the area and the overflow is cropped evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverParams {
    pub width: u32,
    pub height: u32,
    pub filter: FilterType,
}

impl CoverParams {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_params_default_to_lanczos() {
        let p = CoverParams::new(750, 1050);
        assert_eq!((p.width, p.height), (750, 1050));
        assert_eq!(p.filter, FilterType::Lanczos3);
    }
}
