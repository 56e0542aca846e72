//! Sheet geometry: where every cell, border and cut mark sits on the page.
//!
//! All functions here are pure. Every renderer and exporter asks this module
//! for coordinates instead of doing its own arithmetic, so the on-screen grid,
//! the print preview, the PDF and the PNG agree on placement.
//!
//! ## Coordinate system
//!
//! Origin at the page's top-left corner, x to the right, y downward. Values
//! are computed in inches and then scaled by the requested [`Unit`]:
//!
//! | Unit | Per inch | Used by |
//! |---|---|---|
//! | [`Unit::Inches`] | 1 | print preview |
//! | [`Unit::Points`] | 72 | PDF user space (y flipped by the exporter) |
//! | [`Unit::Pixels`] | DPI | on-screen grid (96), PNG export (300) |
//!
//! ## Layout
//!
//! ```text
//! ┌──────────── page ────────────┐
//! │ marginX                      │
//! │   ┌────┐ gap ┌────┐ gap ┌────┐
//! │   │ 0  │     │ 1  │     │ 2  │   cells are 2.5in × 3.5in,
//! │   └────┘     └────┘     └────┘   gap 0.125in, grid centered
//! │   ┌────┐     ┌────┐     ┌────┐
//! │   │ 3  │     │ 4  │     │ 5  │
//! │   ...                        │
//! └──────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed length of the front and back slot arrays, independent of layout.
pub const SLOT_COUNT: usize = 9;
pub const CARD_WIDTH_IN: f64 = 2.5;
pub const CARD_HEIGHT_IN: f64 = 3.5;
pub const GAP_IN: f64 = 0.125;
pub const CUT_MARK_LENGTH_IN: f64 = 0.15;
/// Raster resolution of the interactive grid.
pub const SCREEN_DPI: u32 = 96;
/// Raster resolution of PNG export, irrespective of paper size.
pub const EXPORT_DPI: u32 = 300;
pub const POINTS_PER_INCH: f64 = 72.0;

/// Paper size and grid shape. Exactly one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperLayout {
    /// 3×3 cards on US letter (8.5in × 11in).
    #[default]
    #[serde(rename = "letter")]
    Letter3x3,
    /// A single card on a 4in × 6in photo print.
    #[serde(rename = "photo-4x6")]
    Photo4x6,
}

impl PaperLayout {
    pub const ALL: [PaperLayout; 2] = [PaperLayout::Letter3x3, PaperLayout::Photo4x6];

    pub fn cols(self) -> usize {
        match self {
            PaperLayout::Letter3x3 => 3,
            PaperLayout::Photo4x6 => 1,
        }
    }

    pub fn rows(self) -> usize {
        match self {
            PaperLayout::Letter3x3 => 3,
            PaperLayout::Photo4x6 => 1,
        }
    }

    /// Number of addressable slots under this layout (`cols * rows`).
    pub fn capacity(self) -> usize {
        self.cols() * self.rows()
    }

    pub fn page_width_in(self) -> f64 {
        match self {
            PaperLayout::Letter3x3 => 8.5,
            PaperLayout::Photo4x6 => 4.0,
        }
    }

    pub fn page_height_in(self) -> f64 {
        match self {
            PaperLayout::Letter3x3 => 11.0,
            PaperLayout::Photo4x6 => 6.0,
        }
    }

    /// Whether `index` is addressable under this layout.
    pub fn contains(self, index: usize) -> bool {
        index < self.capacity()
    }

    /// Short identifier used in config files, plan files and export filenames.
    pub fn slug(self) -> &'static str {
        match self {
            PaperLayout::Letter3x3 => "letter",
            PaperLayout::Photo4x6 => "photo-4x6",
        }
    }

    /// Human-readable description for CLI output.
    pub fn label(self) -> &'static str {
        match self {
            PaperLayout::Letter3x3 => "Letter 8.5\" × 11\" (3×3)",
            PaperLayout::Photo4x6 => "Photo 4\" × 6\" (1×1)",
        }
    }
}

impl fmt::Display for PaperLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PaperLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaperLayout::ALL
            .into_iter()
            .find(|layout| layout.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown paper layout '{s}' (expected 'letter' or 'photo-4x6')"))
    }
}

/// Unit system a geometry query is answered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Inches,
    Points,
    /// Pixel raster at the given dots per inch.
    Pixels(u32),
}

impl Unit {
    /// How many of this unit make up one inch.
    pub fn per_inch(self) -> f64 {
        match self {
            Unit::Inches => 1.0,
            Unit::Points => POINTS_PER_INCH,
            Unit::Pixels(dpi) => dpi as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Grow by `amount` on all four sides.
    pub fn expand(&self, amount: f64) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Multiply every coordinate by `factor`.
    pub fn scale(&self, factor: f64) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// A straight line between two points; cut marks are made of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            start: Point { x: x1, y: y1 },
            end: Point { x: x2, y: y2 },
        }
    }

    fn scale(&self, factor: f64) -> Segment {
        Segment::new(
            self.start.x * factor,
            self.start.y * factor,
            self.end.x * factor,
            self.end.y * factor,
        )
    }
}

// =============================================================================
// Inch-space primitives
// =============================================================================

fn grid_rect_in(layout: PaperLayout) -> Rect {
    let cols = layout.cols() as f64;
    let rows = layout.rows() as f64;
    let width = cols * CARD_WIDTH_IN + (cols - 1.0) * GAP_IN;
    let height = rows * CARD_HEIGHT_IN + (rows - 1.0) * GAP_IN;
    let margin_x = (layout.page_width_in() - width) / 2.0;
    let margin_y = (layout.page_height_in() - height) / 2.0;
    Rect::new(margin_x, margin_y, width, height)
}

/// Row and column of a slot in row-major order, if addressable.
pub fn slot_position(layout: PaperLayout, index: usize) -> Option<(usize, usize)> {
    layout
        .contains(index)
        .then(|| (index / layout.cols(), index % layout.cols()))
}

// =============================================================================
// Public queries
// =============================================================================

pub fn page_size(layout: PaperLayout, unit: Unit) -> Size {
    let k = unit.per_inch();
    Size {
        width: layout.page_width_in() * k,
        height: layout.page_height_in() * k,
    }
}

/// Bounding box of all cells and the gaps between them, centered on the page.
pub fn grid_rect(layout: PaperLayout, unit: Unit) -> Rect {
    grid_rect_in(layout).scale(unit.per_inch())
}

/// Area filled when the border flag is set: the grid expanded by one gap on every side.
pub fn border_rect(layout: PaperLayout, unit: Unit) -> Rect {
    grid_rect_in(layout)
        .expand(GAP_IN)
        .scale(unit.per_inch())
}

/// Origin and size of a front-sheet cell. `None` when `index` is not
/// addressable under `layout`.
pub fn slot_rect(layout: PaperLayout, unit: Unit, index: usize) -> Option<Rect> {
    let (row, col) = slot_position(layout, index)?;
    let grid = grid_rect_in(layout);
    let cell = Rect::new(
        grid.x + col as f64 * (CARD_WIDTH_IN + GAP_IN),
        grid.y + row as f64 * (CARD_HEIGHT_IN + GAP_IN),
        CARD_WIDTH_IN,
        CARD_HEIGHT_IN,
    );
    Some(cell.scale(unit.per_inch()))
}

/// Slot that sits physically behind `index` after the sheet is flipped
/// left-to-right. Only the column is reflected; the row is unchanged.
pub fn mirrored_index(layout: PaperLayout, index: usize) -> Option<usize> {
    let (row, col) = slot_position(layout, index)?;
    let mirrored_col = (layout.cols() - 1) - col;
    Some(row * layout.cols() + mirrored_col)
}

/// Trim guides at the four page edges.
///
/// Each column contributes a tick at its left and right edge on both the top
/// and bottom of the page; each row contributes a tick at its top and bottom
/// edge on both the left and right of the page. Nothing is drawn between
/// interior cells.
pub fn cut_marks(layout: PaperLayout, unit: Unit) -> Vec<Segment> {
    let grid = grid_rect_in(layout);
    let page_w = layout.page_width_in();
    let page_h = layout.page_height_in();
    let len = CUT_MARK_LENGTH_IN;
    let mut marks = Vec::with_capacity((layout.cols() + layout.rows()) * 4);

    for col in 0..layout.cols() {
        let left = grid.x + col as f64 * (CARD_WIDTH_IN + GAP_IN);
        for x in [left, left + CARD_WIDTH_IN] {
            marks.push(Segment::new(x, 0.0, x, len));
            marks.push(Segment::new(x, page_h - len, x, page_h));
        }
    }

    for row in 0..layout.rows() {
        let top = grid.y + row as f64 * (CARD_HEIGHT_IN + GAP_IN);
        for y in [top, top + CARD_HEIGHT_IN] {
            marks.push(Segment::new(0.0, y, len, y));
            marks.push(Segment::new(page_w - len, y, page_w, y));
        }
    }

    let k = unit.per_inch();
    marks.into_iter().map(|m| m.scale(k)).collect()
}
