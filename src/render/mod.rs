//! One page-content algorithm, many media.
//!
//! [`plan_page`] turns a [`SessionState`] into a [`PagePlan`]: the page size,
//! the optional border rectangle, every occupied cell with the image it
//! shows, every empty cell, and the cut marks. It does this in whatever
//! [`Unit`] the medium asks for. Backends never compute coordinates or
//! mirroring themselves; they implement [`SheetPainter`] and receive the plan
//! through [`paint`], which fixes the drawing order:
//!
//! 1. `begin_page`
//! 2. border fill (if enabled), behind the whole grid
//! 3. cells, row-major
//! 4. cut marks, page edges only
//! 5. `end_page`
//!
//! ## Backends
//!
//! | Medium | Module | Unit |
//! |---|---|---|
//! | On-screen grid | [`html::render_grid`] | `Pixels(96)` |
//! | Print preview | [`html::render_print_preview`] | `Inches` |
//! | PNG canvas | [`raster::RasterPainter`] | `Pixels(300)` |
//! | PDF content stream | `export::pdf` | `Points` |

pub mod html;
pub mod raster;

use crate::geometry::{self, PaperLayout, Rect, Segment, Size, Unit};
use crate::imaging::ImageSource;
use crate::sheet::SessionState;
use serde::Serialize;
use std::fmt;

/// Which sheet a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Front => f.write_str("front"),
            Side::Back => f.write_str("back"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "fronts" => Ok(Side::Front),
            "back" | "backs" => Ok(Side::Back),
            _ => Err(format!("unknown side '{s}' (expected front or back)")),
        }
    }
}

/// An occupied cell on a page.
#[derive(Debug, Clone)]
pub struct CellPlacement<'a> {
    /// Position on this page, row-major.
    pub slot: usize,
    /// Index into the slot array the image came from. Equal to `slot` on
    /// the front page, `mirrored_index(slot)` on the back page.
    pub source_slot: usize,
    pub rect: Rect,
    pub image: &'a ImageSource,
    /// Library display name (front cells only).
    pub label: Option<&'a str>,
    /// Front cell whose card also has a back image.
    pub has_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmptyCell {
    pub slot: usize,
    pub rect: Rect,
}

/// Everything a backend needs to draw one page.
#[derive(Debug, Clone)]
pub struct PagePlan<'a> {
    pub side: Side,
    pub layout: PaperLayout,
    pub unit: Unit,
    pub page: Size,
    pub border: Option<Rect>,
    pub cells: Vec<CellPlacement<'a>>,
    pub empty: Vec<EmptyCell>,
    pub cut_marks: Vec<Segment>,
}

impl PagePlan<'_> {
    pub fn is_blank(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Project one side of the sheet into `unit`.
pub fn plan_page(state: &SessionState, side: Side, unit: Unit) -> PagePlan<'_> {
    let layout = state.layout();
    let mut cells = Vec::new();
    let mut empty = Vec::new();

    for slot in 0..layout.capacity() {
        // slot < capacity, so both lookups are Some
        let (Some(rect), Some(mirrored)) = (
            geometry::slot_rect(layout, unit, slot),
            geometry::mirrored_index(layout, slot),
        ) else {
            continue;
        };

        let placement = match side {
            Side::Front => state.front(slot).map(|card| CellPlacement {
                slot,
                source_slot: slot,
                rect,
                image: &card.source,
                label: Some(card.display_name.as_str()),
                has_back: state.back(slot).is_some(),
            }),
            Side::Back => state.back(mirrored).map(|image| CellPlacement {
                slot,
                source_slot: mirrored,
                rect,
                image,
                label: None,
                has_back: false,
            }),
        };

        match placement {
            Some(cell) => cells.push(cell),
            None => empty.push(EmptyCell { slot, rect }),
        }
    }

    PagePlan {
        side,
        layout,
        unit,
        page: geometry::page_size(layout, unit),
        border: state
            .border()
            .then(|| geometry::border_rect(layout, unit)),
        cells,
        empty,
        cut_marks: geometry::cut_marks(layout, unit),
    }
}

/// Drawing primitives a medium provides. Coordinates arrive in the plan's unit.
pub trait SheetPainter {
    type Error;

    fn begin_page(&mut self, _plan: &PagePlan<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn border(&mut self, rect: Rect) -> Result<(), Self::Error>;

    fn cell(&mut self, cell: &CellPlacement<'_>) -> Result<(), Self::Error>;

    fn empty_cell(&mut self, _cell: &EmptyCell) -> Result<(), Self::Error> {
        Ok(())
    }

    fn cut_mark(&mut self, segment: &Segment) -> Result<(), Self::Error>;

    fn end_page(&mut self, _plan: &PagePlan<'_>) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Drive a painter through a page in the fixed back-to-front order.
pub fn paint<P: SheetPainter>(plan: &PagePlan<'_>, painter: &mut P) -> Result<(), P::Error> {
    painter.begin_page(plan)?;
    if let Some(border) = plan.border {
        painter.border(border)?;
    }
    for cell in &plan.cells {
        painter.cell(cell)?;
    }
    for cell in &plan.empty {
        painter.empty_cell(cell)?;
    }
    for segment in &plan.cut_marks {
        painter.cut_mark(segment)?;
    }
    painter.end_page(plan)
}
