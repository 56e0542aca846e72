//! PNG export: one page rasterized at 300 DPI.
//!
//! A letter sheet becomes 2550 × 3300 px, a 4×6 photo 1200 × 1800 px. The
//! encoded file carries a `pHYs` chunk declaring 300 DPI.

use super::{DecodedPages, EmbedFailure, ExportError, PageReport};
use crate::geometry::{EXPORT_DPI, Unit};
use crate::imaging::ImageBackend;
use crate::png_chunks::encode_png_with_physical_resolution;
use crate::render::raster::RasterPainter;
use crate::render::{Side, paint, plan_page};
use crate::sheet::SessionState;
use image::ImageFormat;
use std::collections::HashMap;
use std::io::Cursor;

pub(crate) fn render_png<B: ImageBackend>(
    backend: &B,
    state: &SessionState,
    side: Side,
    decoded: DecodedPages,
) -> Result<(Vec<u8>, Vec<PageReport>, Vec<EmbedFailure>), ExportError> {
    let plan = plan_page(state, side, Unit::Pixels(EXPORT_DPI));
    let empty = HashMap::new();
    let images = decoded.side(side).unwrap_or(&empty);

    let mut painter =
        RasterPainter::for_plan(backend, images, &plan).ok_or(ExportError::RasterAllocation {
            width: plan.page.width.round() as u32,
            height: plan.page.height.round() as u32,
        })?;
    let Ok(()) = paint(&plan, &mut painter);
    let (canvas, cover_failures) = painter.finish();

    let mut failures = decoded.failures.clone();
    failures.extend(cover_failures.into_iter().map(|f| EmbedFailure {
        side,
        slot: f.slot,
        source_slot: f.source_slot,
        reason: f.error.to_string(),
    }));

    let placed = plan
        .cells
        .iter()
        .filter(|c| !failures.iter().any(|f| f.side == side && f.slot == c.slot))
        .map(|c| c.slot)
        .collect();

    let mut encoded = Cursor::new(Vec::new());
    canvas.write_to(&mut encoded, ImageFormat::Png)?;
    let bytes = encode_png_with_physical_resolution(&encoded.into_inner(), EXPORT_DPI)?;
    tracing::debug!(%side, width = canvas.width(), height = canvas.height(), "png page rasterized");

    Ok((bytes, vec![PageReport { side, placed }], failures))
}
