//! Pure calculation functions for cover-fitting images into cells.
//!
//! Cards are always placed at exactly the cell size. Sources with a different
//! aspect ratio are scaled to *cover* the cell and the overflow is clipped,
//! never letterboxed and never stretched. The raster path uses the integer
//! functions; the PDF path, which clips in vector space, uses [`cover_rect`].

use crate::geometry::Rect;

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Top-left offset of a centered `target` crop within `filled`.
pub fn center_crop_offset(filled: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        filled.0.saturating_sub(target.0) / 2,
        filled.1.saturating_sub(target.1) / 2,
    )
}

/// Where to draw a `source`-sized image so that it covers `cell`, centered.
///
/// The returned rectangle contains `cell`; the caller clips to `cell`.
pub fn cover_rect(source: (u32, u32), cell: Rect) -> Rect {
    let (src_w, src_h) = (source.0.max(1) as f64, source.1.max(1) as f64);
    let scale = (cell.width / src_w).max(cell.height / src_h);
    let width = src_w * scale;
    let height = src_h * scale;
    Rect::new(
        cell.x + (cell.width - width) / 2.0,
        cell.y + (cell.height - height) / 2.0,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn fill_wider_source_to_card_cell() {
        // 800x600 (4:3) → 750x1050 cell: height matches, width = 1050 * 4/3 = 1400
        assert_eq!(calculate_fill_dimensions((800, 600), (750, 1050)), (1400, 1050));
    }

    #[test]
    fn fill_taller_source_to_card_cell() {
        // 500x1000 (1:2) → 750x1050: width matches, height = 750 * 2 = 1500
        assert_eq!(calculate_fill_dimensions((500, 1000), (750, 1050)), (750, 1500));
    }

    #[test]
    fn fill_same_aspect_ratio() {
        // 50x70 is exactly the 5:7 card ratio
        assert_eq!(calculate_fill_dimensions((50, 70), (750, 1050)), (750, 1050));
    }

    #[test]
    fn fill_never_undershoots_target() {
        for source in [(1, 1000), (1000, 1), (333, 777), (749, 1051)] {
            let (w, h) = calculate_fill_dimensions(source, (750, 1050));
            assert!(w >= 750 && h >= 1050, "{source:?} → {w}x{h}");
        }
    }

    // =========================================================================
    // center_crop_offset tests
    // =========================================================================

    #[test]
    fn crop_offset_centers_overflow() {
        assert_eq!(center_crop_offset((1400, 1050), (750, 1050)), (325, 0));
        assert_eq!(center_crop_offset((750, 1500), (750, 1050)), (0, 225));
    }

    #[test]
    fn crop_offset_zero_when_exact() {
        assert_eq!(center_crop_offset((750, 1050), (750, 1050)), (0, 0));
    }

    // =========================================================================
    // cover_rect tests
    // =========================================================================

    #[test]
    fn cover_rect_matches_cell_for_card_aspect() {
        let cell = Rect::new(27.0, 9.0, 180.0, 252.0);
        let r = cover_rect((500, 700), cell);
        assert!((r.x - 27.0).abs() < 1e-9);
        assert!((r.y - 9.0).abs() < 1e-9);
        assert!((r.width - 180.0).abs() < 1e-9);
        assert!((r.height - 252.0).abs() < 1e-9);
    }

    #[test]
    fn cover_rect_overflows_horizontally_for_landscape_source() {
        let cell = Rect::new(0.0, 0.0, 2.5, 3.5);
        let r = cover_rect((400, 200), cell);
        assert!((r.height - 3.5).abs() < 1e-9);
        assert!((r.width - 7.0).abs() < 1e-9);
        // centered: equal overflow on both sides
        assert!((r.x + 2.25).abs() < 1e-9);
    }

    #[test]
    fn cover_rect_always_contains_cell() {
        let cell = Rect::new(1.0, 2.0, 2.5, 3.5);
        for source in [(1, 1), (10, 1), (1, 10), (640, 480)] {
            let r = cover_rect(source, cell);
            assert!(r.x <= cell.x + 1e-9 && r.y <= cell.y + 1e-9);
            assert!(r.right() >= cell.right() - 1e-9 && r.bottom() >= cell.bottom() - 1e-9);
        }
    }
}
