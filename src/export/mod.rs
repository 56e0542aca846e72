//! Print-ready export: PDF and 300 DPI PNG.
//!
//! [`request_export`] is the single entry point. It runs in four steps:
//!
//! 1. **Pre-flight**: reject exports that would be empty or ill-formed
//!    ([`ExportError::NoCardsPlaced`], [`ExportError::NoBacksAvailable`],
//!    [`ExportError::UnsupportedMode`]) before any decoding happens.
//! 2. **Page selection**: fronts, backs, or both (PDF only). A "both" export
//!    with no back images emits just the front page.
//! 3. **Join-all decode**: every image any selected page needs is decoded in
//!    parallel and the export waits for all of them. Failures become
//!    [`EmbedFailure`] entries and blank cells, never an aborted export.
//! 4. **Assembly** by [`pdf`] or [`png`], both driven by the shared
//!    [`PagePlan`](crate::render::PagePlan).
//!
//! The exporter reads a `&SessionState`. States are immutable values, so the
//! borrow is the snapshot: nothing can change the sheet while it is read.

pub mod pdf;
pub mod png;

use crate::geometry::{EXPORT_DPI, PaperLayout, Unit};
use crate::imaging::{ImageBackend, RustBackend, decode_all};
use crate::render::{Side, plan_page};
use crate::sheet::SessionState;
use chrono::NaiveDateTime;
use image::DynamicImage;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_FILENAME_PREFIX: &str = "trading-cards";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no cards placed on the sheet")]
    NoCardsPlaced,
    #[error("no back images to export")]
    NoBacksAvailable,
    #[error("{format} export does not support mode '{mode}' (export fronts and backs separately)")]
    UnsupportedMode {
        format: ExportFormat,
        mode: ExportMode,
    },
    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("PNG metadata patch failed: {0}")]
    Chunk(#[from] crate::png_chunks::ChunkError),
    #[error("cannot allocate a {width}x{height} raster")]
    RasterAllocation { width: u32, height: u32 },
}

/// Which sheet(s) an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    Front,
    Back,
    Both,
}

impl ExportMode {
    pub fn filename_part(self) -> &'static str {
        match self {
            ExportMode::Front => "fronts",
            ExportMode::Back => "backs",
            ExportMode::Both => "fronts-and-backs",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportMode::Front => "front",
            ExportMode::Back => "back",
            ExportMode::Both => "both",
        })
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "fronts" => Ok(ExportMode::Front),
            "back" | "backs" => Ok(ExportMode::Back),
            "both" => Ok(ExportMode::Both),
            _ => Err(format!("unknown export mode '{s}' (expected front, back or both)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Png => "PNG",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            _ => Err(format!("unknown export format '{s}' (expected pdf or png)")),
        }
    }
}

/// Caller-tunable export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub filename_prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

/// One image that could not be decoded or embedded. Its cell was left blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFailure {
    pub side: Side,
    /// Position on the page.
    pub slot: usize,
    /// Slot-array index the image came from.
    pub source_slot: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub side: Side,
    /// Page positions that received an image.
    pub placed: Vec<usize>,
}

/// What an export produced, page by page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub mode: ExportMode,
    pub layout: PaperLayout,
    pub pages: Vec<PageReport>,
    pub failures: Vec<EmbedFailure>,
}

impl ExportReport {
    pub fn placed_total(&self) -> usize {
        self.pages.iter().map(|p| p.placed.len()).sum()
    }
}

/// A finished, downloadable export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
    pub report: ExportReport,
}

// ============================================================================
// Pre-flight and page selection
// ============================================================================

/// Reject exports that cannot produce a useful artifact.
pub fn preflight(
    state: &SessionState,
    mode: ExportMode,
    format: ExportFormat,
) -> Result<(), ExportError> {
    if state.placed_count() == 0 {
        return Err(ExportError::NoCardsPlaced);
    }
    if format == ExportFormat::Png && mode == ExportMode::Both {
        return Err(ExportError::UnsupportedMode { format, mode });
    }
    if mode == ExportMode::Back && !state.has_any_back() {
        return Err(ExportError::NoBacksAvailable);
    }
    Ok(())
}

/// Pages an export emits, in order.
pub fn sides_for(state: &SessionState, mode: ExportMode) -> Vec<Side> {
    match mode {
        ExportMode::Front => vec![Side::Front],
        ExportMode::Back => vec![Side::Back],
        ExportMode::Both if state.has_any_back() => vec![Side::Front, Side::Back],
        ExportMode::Both => vec![Side::Front],
    }
}

/// Suggested download name, unique to the second.
///
/// PDF: `{prefix}-{fronts|backs|fronts-and-backs}-{layout}-{YYYY-MM-DD-HHMMSS}.pdf`
/// PNG: `{prefix}-{fronts|backs}-{layout}-300dpi-{YYYY-MM-DD-HHMMSS}.png`
pub fn export_filename(
    prefix: &str,
    mode: ExportMode,
    format: ExportFormat,
    layout: PaperLayout,
    timestamp: NaiveDateTime,
) -> String {
    let stamp = timestamp.format("%Y-%m-%d-%H%M%S");
    match format {
        ExportFormat::Pdf => format!(
            "{prefix}-{}-{}-{stamp}.pdf",
            mode.filename_part(),
            layout.slug()
        ),
        ExportFormat::Png => format!(
            "{prefix}-{}-{}-{EXPORT_DPI}dpi-{stamp}.png",
            mode.filename_part(),
            layout.slug()
        ),
    }
}

// ============================================================================
// Join-all decode
// ============================================================================

/// Decoded pixels for every selected page, keyed by side then source slot.
#[derive(Debug, Default)]
pub(crate) struct DecodedPages {
    pub images: HashMap<Side, HashMap<usize, DynamicImage>>,
    pub failures: Vec<EmbedFailure>,
}

impl DecodedPages {
    pub fn side(&self, side: Side) -> Option<&HashMap<usize, DynamicImage>> {
        self.images.get(&side)
    }
}

pub(crate) fn decode_pages<B: ImageBackend>(
    backend: &B,
    state: &SessionState,
    sides: &[Side],
) -> DecodedPages {
    let jobs = sides
        .iter()
        .flat_map(|&side| {
            plan_page(state, side, Unit::Inches)
                .cells
                .into_iter()
                .map(move |cell| ((side, cell.slot, cell.source_slot), cell.image.clone()))
        })
        .collect();

    let mut out = DecodedPages::default();
    for decoded in decode_all(backend, jobs) {
        let (side, slot, source_slot) = decoded.key;
        match decoded.result {
            Ok(image) => {
                out.images.entry(side).or_default().insert(source_slot, image);
            }
            Err(e) => {
                tracing::warn!(%side, slot, source_slot, error = %e, "image could not be decoded, leaving cell blank");
                out.failures.push(EmbedFailure {
                    side,
                    slot,
                    source_slot,
                    reason: e.to_string(),
                });
            }
        }
    }
    out
}

// ============================================================================
// Entry points
// ============================================================================

/// Export with the production image backend, stamped with the local time.
pub fn request_export(
    state: &SessionState,
    mode: ExportMode,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportArtifact, ExportError> {
    let now = chrono::Local::now().naive_local();
    request_export_with_backend(&RustBackend::new(), state, mode, format, options, now)
}

pub fn request_export_with_backend<B: ImageBackend>(
    backend: &B,
    state: &SessionState,
    mode: ExportMode,
    format: ExportFormat,
    options: &ExportOptions,
    now: NaiveDateTime,
) -> Result<ExportArtifact, ExportError> {
    preflight(state, mode, format)?;
    let sides = sides_for(state, mode);
    let decoded = decode_pages(backend, state, &sides);

    let (bytes, pages, failures) = match format {
        ExportFormat::Pdf => pdf::render_pdf(state, &sides, decoded, now)?,
        ExportFormat::Png => png::render_png(backend, state, sides[0], decoded)?,
    };

    let report = ExportReport {
        format,
        mode,
        layout: state.layout(),
        pages,
        failures,
    };
    tracing::info!(
        %format,
        %mode,
        pages = report.pages.len(),
        placed = report.placed_total(),
        failed = report.failures.len(),
        bytes = bytes.len(),
        "export complete"
    );

    Ok(ExportArtifact {
        bytes,
        filename: export_filename(&options.filename_prefix, mode, format, state.layout(), now),
        mime_type: format.mime_type(),
        report,
    })
}
