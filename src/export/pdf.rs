//! PDF assembly with lopdf.
//!
//! Each page is a content stream painted from a [`PagePlan`] in points. PDF
//! user space has its origin at the bottom-left, so every rectangle is
//! flipped: `pdf_y = page_height - (y + height)`.
//!
//! Images are placed with cover semantics by clipping to the cell and drawing
//! the scaled image over it:
//!
//! ```text
//! q
//!   x y w h re W n          % clip to the cell
//!   dw 0 0 dh ox oy cm      % image space -> cover rect
//!   /ImF0 Do
//! Q
//! ```
//!
//! Baseline and progressive JPEGs with one or three components are embedded
//! as-is (`DCTDecode`); everything else becomes Flate-compressed 8-bit RGB,
//! plus a soft mask when the source has alpha.

use super::{DecodedPages, EmbedFailure, ExportError, PageReport};
use crate::geometry::{Rect, Segment, Unit};
use crate::imaging::ImageSource;
use crate::imaging::calculations::cover_rect;
use crate::render::{CellPlacement, PagePlan, SheetPainter, Side, paint, plan_page};
use crate::sheet::SessionState;
use chrono::NaiveDateTime;
use image::{DynamicImage, GenericImageView, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::HashMap;
use std::convert::Infallible;

/// Cut mark stroke width in points.
const HAIRLINE_PT: f64 = 0.25;

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// An image XObject ready to be referenced from a page.
#[derive(Debug, Clone, Copy)]
struct Embedded {
    id: ObjectId,
    width: u32,
    height: u32,
}

// ============================================================================
// Image embedding
// ============================================================================

/// Colour space for JPEG pass-through, read from the frame header.
///
/// Returns `None` for anything that should be re-encoded instead: non-JPEG
/// data, CMYK or YCCK (four components), arithmetic coding, or a header that
/// cannot be found.
pub fn jpeg_passthrough_colorspace(bytes: &[u8]) -> Option<&'static str> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        match marker {
            // fill byte
            0xFF => {
                i += 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                i += 2;
                continue;
            }
            // start of scan: no frame header seen
            0xDA | 0xD9 => return None,
            _ => {}
        }
        let len = usize::from(u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]));
        // SOF0 baseline, SOF1 extended, SOF2 progressive (Huffman coded)
        if matches!(marker, 0xC0..=0xC2) {
            let components = *bytes.get(i + 9)?;
            return match components {
                1 => Some("DeviceGray"),
                3 => Some("DeviceRGB"),
                _ => None,
            };
        }
        i += 2 + len;
    }
    None
}

fn image_dictionary(width: u32, height: u32, color_space: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
    }
}

fn embed_image(
    doc: &mut Document,
    source: &ImageSource,
    image: &DynamicImage,
) -> Result<Embedded, lopdf::Error> {
    let (width, height) = image.dimensions();

    let passthrough = match source.format() {
        Some(ImageFormat::Jpeg) => jpeg_passthrough_colorspace(source.bytes()),
        _ => None,
    };
    if let Some(space) = passthrough {
        let mut dict = image_dictionary(width, height, space);
        dict.set("Filter", "DCTDecode");
        let stream = Stream::new(dict, source.bytes().to_vec()).with_compression(false);
        let id = doc.add_object(stream);
        return Ok(Embedded { id, width, height });
    }

    let mut dict = image_dictionary(width, height, "DeviceRGB");
    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mut mask = Stream::new(image_dictionary(width, height, "DeviceGray"), alpha);
        mask.compress()?;
        dict.set("SMask", doc.add_object(mask));
    }
    let mut stream = Stream::new(dict, image.to_rgb8().into_raw());
    stream.compress()?;
    let id = doc.add_object(stream);
    Ok(Embedded { id, width, height })
}

// ============================================================================
// Page painter
// ============================================================================

struct PdfPainter<'a> {
    page_height: f64,
    name_prefix: &'static str,
    images: &'a HashMap<usize, Embedded>,
    xobjects: Dictionary,
    ops: Vec<Operation>,
    stroke_ready: bool,
}

impl<'a> PdfPainter<'a> {
    fn new(side: Side, page_height: f64, images: &'a HashMap<usize, Embedded>) -> Self {
        Self {
            page_height,
            name_prefix: match side {
                Side::Front => "ImF",
                Side::Back => "ImB",
            },
            images,
            xobjects: Dictionary::new(),
            ops: Vec::new(),
            stroke_ready: false,
        }
    }

    fn flip_y(&self, rect: Rect) -> f64 {
        self.page_height - rect.bottom()
    }

    fn rect_op(&self, rect: Rect) -> Operation {
        Operation::new(
            "re",
            vec![
                real(rect.x),
                real(self.flip_y(rect)),
                real(rect.width),
                real(rect.height),
            ],
        )
    }
}

impl SheetPainter for PdfPainter<'_> {
    type Error = Infallible;

    fn border(&mut self, rect: Rect) -> Result<(), Infallible> {
        self.ops.push(Operation::new("q", vec![]));
        self.ops
            .push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
        self.ops.push(self.rect_op(rect));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn cell(&mut self, cell: &CellPlacement<'_>) -> Result<(), Infallible> {
        let Some(embedded) = self.images.get(&cell.source_slot) else {
            return Ok(());
        };
        let name = format!("{}{}", self.name_prefix, cell.source_slot);
        self.xobjects.set(name.as_bytes(), embedded.id);

        let cover = cover_rect((embedded.width, embedded.height), cell.rect);
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(self.rect_op(cell.rect));
        self.ops.push(Operation::new("W", vec![]));
        self.ops.push(Operation::new("n", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                real(cover.width),
                0.into(),
                0.into(),
                real(cover.height),
                real(cover.x),
                real(self.flip_y(cover)),
            ],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn cut_mark(&mut self, segment: &Segment) -> Result<(), Infallible> {
        if !self.stroke_ready {
            self.ops
                .push(Operation::new("RG", vec![0.into(), 0.into(), 0.into()]));
            self.ops.push(Operation::new("w", vec![real(HAIRLINE_PT)]));
            self.stroke_ready = true;
        }
        self.ops.push(Operation::new(
            "m",
            vec![
                real(segment.start.x),
                real(self.page_height - segment.start.y),
            ],
        ));
        self.ops.push(Operation::new(
            "l",
            vec![real(segment.end.x), real(self.page_height - segment.end.y)],
        ));
        self.ops.push(Operation::new("S", vec![]));
        Ok(())
    }
}

// ============================================================================
// Document assembly
// ============================================================================

fn pdf_date(timestamp: NaiveDateTime) -> String {
    format!("D:{}", timestamp.format("%Y%m%d%H%M%S"))
}

/// Build the document for `sides`, in order.
pub(crate) fn render_pdf(
    state: &SessionState,
    sides: &[Side],
    decoded: DecodedPages,
    created: NaiveDateTime,
) -> Result<(Vec<u8>, Vec<PageReport>, Vec<EmbedFailure>), ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut failures = decoded.failures.clone();
    let mut kids: Vec<Object> = Vec::new();
    let mut reports = Vec::new();

    for &side in sides {
        let plan: PagePlan<'_> = plan_page(state, side, Unit::Points);

        let mut embedded = HashMap::new();
        for cell in &plan.cells {
            let Some(image) = decoded.side(side).and_then(|m| m.get(&cell.source_slot)) else {
                continue;
            };
            match embed_image(&mut doc, cell.image, image) {
                Ok(e) => {
                    embedded.insert(cell.source_slot, e);
                }
                Err(e) => {
                    tracing::warn!(%side, slot = cell.slot, error = %e, "image could not be embedded, leaving cell blank");
                    failures.push(EmbedFailure {
                        side,
                        slot: cell.slot,
                        source_slot: cell.source_slot,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut painter = PdfPainter::new(side, plan.page.height, &embedded);
        let Ok(()) = paint(&plan, &mut painter);

        let content = Content {
            operations: painter.ops,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(plan.page.width), real(plan.page.height)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => painter.xobjects,
            },
        });
        kids.push(page_id.into());

        let placed = plan
            .cells
            .iter()
            .filter(|c| embedded.contains_key(&c.source_slot))
            .map(|c| c.slot)
            .collect();
        tracing::debug!(%side, cells = plan.cells.len(), "pdf page assembled");
        reports.push(PageReport { side, placed });
    }

    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        },
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let date = pdf_date(created);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(format!("Trading card sheet ({})", state.layout().label())),
        "Producer" => Object::string_literal(concat!("cardsheet ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(date.clone()),
        "ModDate" => Object::string_literal(date),
    });
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok((buffer, reports, failures))
}
