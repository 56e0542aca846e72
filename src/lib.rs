//! # Card Sheet
//!
//! Lays out trading-card images on a fixed print sheet and exports it as a
//! print-ready PDF or a 300 DPI PNG. A sheet is either a 3×3 grid on US
//! letter or a single card on a 4×6 photo print; cards are always
//! 2.5in × 3.5in with a 0.125in gap, centered on the page. Each front may
//! carry a back image, printed on a second page mirrored so that it lands
//! behind its front once the sheet is flipped.
//!
//! # Architecture: One Geometry, Many Media
//!
//! ```text
//! UI event ─▶ Session ─▶ SessionState (immutable)
//!                              │
//!                   plan_page(state, side, unit)
//!                              │
//!        ┌──────────────┬──────┴───────┬──────────────┐
//!        ▼              ▼              ▼              ▼
//!   on-screen grid  print preview   PDF page      PNG canvas
//!    (96 DPI px)      (inches)      (points)     (300 DPI px)
//! ```
//!
//! Every medium draws the same [`render::PagePlan`]. Cell rectangles,
//! back-page mirroring, border fill and cut marks are computed once, in
//! [`geometry`], so the preview the user sees is the page that prints.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Paper layouts, unit systems, slot rectangles, mirroring, cut marks |
//! | [`sheet`] | Image library and the nine-slot front/back arrays as an immutable value |
//! | [`session`] | The calls a UI makes (place, attach back, switch layout, export) plus undo/redo |
//! | [`render`] | Page planning and the [`render::SheetPainter`] trait; HTML and raster backends |
//! | [`imaging`] | Image decode and cover-fit behind the [`imaging::ImageBackend`] trait |
//! | [`export`] | Pre-flight checks, parallel decode, PDF and PNG assembly, filenames |
//! | [`png_chunks`] | PNG chunk walking, CRC-32, and the `pHYs` physical-resolution patch |
//! | [`plan`] | TOML sheet plans for building a sheet from the command line |
//! | [`config`] | `config.toml` loading, merging over stock defaults, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Immutable Session State
//!
//! [`sheet::SessionState`] is a value. Every mutation returns a new state;
//! images are shared through `Arc`, so a copy costs a few pointers per slot.
//! Exporters read a snapshot that nothing can change underneath them, and
//! [`session::Session`] gets undo/redo by keeping old states on a stack.
//!
//! ## Layout Switches Never Destroy Data
//!
//! Both slot arrays always hold nine entries. Switching to the 4×6 layout
//! makes only slot 0 addressable; the other eight are hidden, not cleared, and
//! reappear when switching back to letter.
//!
//! ## Partial Success Over All-or-Nothing
//!
//! An image that fails to decode leaves its cell blank, is logged with
//! `tracing::warn!`, and is listed in the [`export::ExportReport`]. The
//! export still completes. Only pipeline failures (PDF assembly, raster
//! allocation) abort without an artifact.
//!
//! ## Pure-Rust Output
//!
//! PDF pages are written with `lopdf`, rasters composed with `image`, and
//! HTML generated with Maud. No system libraries are needed.

pub mod config;
pub mod export;
pub mod geometry;
pub mod imaging;
pub mod output;
pub mod plan;
pub mod png_chunks;
pub mod render;
pub mod session;
pub mod sheet;
