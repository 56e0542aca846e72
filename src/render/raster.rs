//! Raster canvas backend.
//!
//! Paints a [`PagePlan`] expressed in `Unit::Pixels(dpi)` onto a white RGBA
//! canvas. Rectangles are snapped to whole pixels by rounding their edges,
//! so neighbouring cells never overlap or leave a seam. Cell images arrive
//! already decoded; the painter only cover-fits and composites them.

use super::{CellPlacement, PagePlan, SheetPainter};
use crate::geometry::{Rect, Segment};
use crate::imaging::{BackendError, CoverParams, ImageBackend};
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use std::collections::HashMap;
use std::convert::Infallible;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Largest canvas we attempt to allocate, in bytes.
const MAX_CANVAS_BYTES: u64 = 1 << 30;

/// A cell whose decoded image could not be fitted to its cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverFailure {
    pub slot: usize,
    pub source_slot: usize,
    pub error: BackendError,
}

/// Whole-pixel bounds of `rect`: `(x, y, width, height)`.
pub fn pixel_bounds(rect: Rect) -> (i64, i64, u32, u32) {
    let x0 = rect.x.round() as i64;
    let y0 = rect.y.round() as i64;
    let x1 = rect.right().round() as i64;
    let y1 = rect.bottom().round() as i64;
    (x0, y0, (x1 - x0).max(0) as u32, (y1 - y0).max(0) as u32)
}

pub struct RasterPainter<'a, B: ImageBackend> {
    backend: &'a B,
    /// Decoded images keyed by the slot-array index they came from.
    images: &'a HashMap<usize, DynamicImage>,
    canvas: RgbaImage,
    failures: Vec<CoverFailure>,
}

impl<'a, B: ImageBackend> RasterPainter<'a, B> {
    /// White canvas of `width` × `height`. `None` when the raster is too
    /// large to allocate.
    pub fn new(
        backend: &'a B,
        images: &'a HashMap<usize, DynamicImage>,
        width: u32,
        height: u32,
    ) -> Option<Self> {
        let bytes = u64::from(width) * u64::from(height) * 4;
        if width == 0 || height == 0 || bytes > MAX_CANVAS_BYTES {
            return None;
        }
        Some(Self {
            backend,
            images,
            canvas: RgbaImage::from_pixel(width, height, WHITE),
            failures: Vec::new(),
        })
    }

    /// Canvas sized to the plan's page.
    pub fn for_plan(
        backend: &'a B,
        images: &'a HashMap<usize, DynamicImage>,
        plan: &PagePlan<'_>,
    ) -> Option<Self> {
        Self::new(
            backend,
            images,
            plan.page.width.round() as u32,
            plan.page.height.round() as u32,
        )
    }

    fn fill(&mut self, rect: Rect, color: Rgba<u8>) {
        let (x, y, w, h) = pixel_bounds(rect);
        if w == 0 || h == 0 {
            return;
        }
        let patch = RgbaImage::from_pixel(w, h, color);
        imageops::replace(&mut self.canvas, &patch, x, y);
    }

    pub fn finish(self) -> (RgbaImage, Vec<CoverFailure>) {
        (self.canvas, self.failures)
    }
}

impl<B: ImageBackend> SheetPainter for RasterPainter<'_, B> {
    type Error = Infallible;

    fn border(&mut self, rect: Rect) -> Result<(), Infallible> {
        self.fill(rect, BLACK);
        Ok(())
    }

    fn cell(&mut self, cell: &CellPlacement<'_>) -> Result<(), Infallible> {
        // Undecodable sources were reported upstream; the cell stays blank.
        let Some(image) = self.images.get(&cell.source_slot) else {
            return Ok(());
        };
        let (x, y, w, h) = pixel_bounds(cell.rect);
        match self.backend.cover(image, &CoverParams::new(w, h)) {
            Ok(fitted) => imageops::overlay(&mut self.canvas, &fitted, x, y),
            Err(error) => {
                tracing::warn!(slot = cell.slot, %error, "cover fit failed, leaving cell blank");
                self.failures.push(CoverFailure {
                    slot: cell.slot,
                    source_slot: cell.source_slot,
                    error,
                });
            }
        }
        Ok(())
    }

    fn cut_mark(&mut self, segment: &Segment) -> Result<(), Infallible> {
        let x = segment.start.x.min(segment.end.x);
        let y = segment.start.y.min(segment.end.y);
        let w = (segment.end.x - segment.start.x).abs().max(1.0);
        let h = (segment.end.y - segment.start.y).abs().max(1.0);
        self.fill(Rect::new(x, y, w, h), BLACK);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PaperLayout, Unit};
    use crate::imaging::ImageSource;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::render::{Side, paint, plan_page};
    use crate::sheet::SessionState;

    fn src(tag: &str) -> ImageSource {
        ImageSource::from_bytes(tag.as_bytes().to_vec()).unwrap()
    }

    fn photo_state() -> SessionState {
        let (state, a) = SessionState::new(PaperLayout::Photo4x6).add_to_library(src("A"), "a");
        state.place(a, 0).unwrap()
    }

    fn decoded_for(slots: &[usize]) -> HashMap<usize, DynamicImage> {
        slots
            .iter()
            .map(|&s| (s, DynamicImage::new_rgba8(50, 70)))
            .collect()
    }

    #[test]
    fn pixel_bounds_round_edges() {
        // letter slot 0 at 300 DPI starts at 112.5px
        let r = Rect::new(112.5, 37.5, 750.0, 1050.0);
        assert_eq!(pixel_bounds(r), (113, 38, 750, 1050));
        // adjacent cell 37.5px later shares no pixels
        let next = Rect::new(900.0, 37.5, 750.0, 1050.0);
        let (x, ..) = pixel_bounds(next);
        assert!(x >= 113 + 750);
    }

    #[test]
    fn rejects_oversized_canvas() {
        let backend = MockBackend::new();
        let images = HashMap::new();
        assert!(RasterPainter::new(&backend, &images, 100_000, 100_000).is_none());
        assert!(RasterPainter::new(&backend, &images, 0, 10).is_none());
    }

    #[test]
    fn photo_page_composites_cell_over_white() {
        let state = photo_state();
        let plan = plan_page(&state, Side::Front, Unit::Pixels(300));
        let backend = MockBackend::new();
        let images = decoded_for(&[0]);
        let mut painter = RasterPainter::for_plan(&backend, &images, &plan).unwrap();
        let Ok(()) = paint(&plan, &mut painter);
        let (canvas, failures) = painter.finish();

        assert!(failures.is_empty());
        assert_eq!(canvas.dimensions(), (1200, 1800));
        // cell: x = (4 - 2.5) / 2 = 0.75in = 225px, y = (6 - 3.5) / 2 = 1.25in = 375px
        assert_eq!(*canvas.get_pixel(600, 900), Rgba([200, 30, 30, 255]));
        assert_eq!(*canvas.get_pixel(224, 900), WHITE);
        assert_eq!(*canvas.get_pixel(225, 900), Rgba([200, 30, 30, 255]));
        assert!(backend.get_operations().contains(&RecordedOp::Cover {
            width: 750,
            height: 1050
        }));
    }

    #[test]
    fn missing_decode_leaves_cell_blank() {
        let state = photo_state();
        let plan = plan_page(&state, Side::Front, Unit::Pixels(300));
        let backend = MockBackend::new();
        let images = HashMap::new();
        let mut painter = RasterPainter::for_plan(&backend, &images, &plan).unwrap();
        let Ok(()) = paint(&plan, &mut painter);
        let (canvas, _) = painter.finish();
        assert_eq!(*canvas.get_pixel(600, 900), WHITE);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn border_fills_behind_grid() {
        let state = photo_state().with_border(true);
        let plan = plan_page(&state, Side::Front, Unit::Pixels(300));
        let backend = MockBackend::new();
        let images = decoded_for(&[0]);
        let mut painter = RasterPainter::for_plan(&backend, &images, &plan).unwrap();
        let Ok(()) = paint(&plan, &mut painter);
        let (canvas, _) = painter.finish();
        // border extends 0.125in = 37.5px beyond the cell: 225 - 37.5 = 187.5
        assert_eq!(*canvas.get_pixel(200, 900), BLACK);
        assert_eq!(*canvas.get_pixel(180, 900), WHITE);
    }

    #[test]
    fn cut_marks_touch_page_edges() {
        let state = photo_state();
        let plan = plan_page(&state, Side::Front, Unit::Pixels(300));
        let backend = MockBackend::new();
        let images = HashMap::new();
        let mut painter = RasterPainter::for_plan(&backend, &images, &plan).unwrap();
        let Ok(()) = paint(&plan, &mut painter);
        let (canvas, _) = painter.finish();
        // vertical tick at the cell's left edge, top of page, 0.15in = 45px long
        assert_eq!(*canvas.get_pixel(225, 0), BLACK);
        assert_eq!(*canvas.get_pixel(225, 44), BLACK);
        assert_eq!(*canvas.get_pixel(225, 46), WHITE);
        // horizontal tick at the cell's top edge, left of page
        assert_eq!(*canvas.get_pixel(0, 375), BLACK);
    }
}
