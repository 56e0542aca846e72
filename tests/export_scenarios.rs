//! End-to-end export scenarios through the public session API.
//!
//! Images here are real encoded PNGs decoded by the production backend, and
//! the artifacts are inspected by re-parsing them: PDFs with `lopdf`, PNGs
//! with `image` plus a byte-level chunk walk.

use cardsheet::export::{ExportError, ExportFormat, ExportMode};
use cardsheet::geometry::{PaperLayout, mirrored_index};
use cardsheet::imaging::ImageSource;
use cardsheet::session::Session;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::Document;
use lopdf::content::{Content, Operation};
use std::io::Cursor;

fn solid_png(color: [u8; 3]) -> ImageSource {
    // 5:7, the card aspect, so cover-fit needs no crop
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(250, 350, Rgb(color)));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    ImageSource::from_bytes(buf.into_inner()).unwrap()
}

fn page_ops(doc: &Document, page: u32) -> Vec<Operation> {
    let id = doc.get_pages()[&page];
    Content::decode(&doc.get_page_content(id).unwrap())
        .unwrap()
        .operations
}

fn clip_rects(ops: &[Operation]) -> Vec<Vec<f32>> {
    ops.iter()
        .filter(|o| o.operator == "re")
        .map(|o| o.operands.iter().map(|v| v.as_float().unwrap()).collect())
        .collect()
}

fn close(actual: image::Rgba<u8>, expected: [u8; 3]) -> bool {
    actual.0[..3]
        .iter()
        .zip(expected)
        .all(|(a, e)| (*a as i16 - e as i16).abs() <= 2)
}

/// Bit-at-a-time CRC-32 (reflected, polynomial 0xEDB88320).
fn reference_crc(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    crc ^ 0xFFFF_FFFF
}

const RED: [u8; 3] = [220, 20, 20];
const GREEN: [u8; 3] = [20, 180, 40];
const BLUE: [u8; 3] = [30, 40, 210];

// =============================================================================
// Round trip: fronts and mirrored backs in one PDF
// =============================================================================

#[test]
fn pdf_both_sides_round_trip() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    session.on_file_dropped(solid_png(GREEN), "b.png", 4).unwrap();
    assert!(session.on_back_image_provided(0, solid_png(BLUE)));

    let artifact = session
        .request_export(ExportMode::Both, ExportFormat::Pdf)
        .unwrap();
    assert_eq!(artifact.mime_type, "application/pdf");
    assert!(artifact.filename.contains("fronts-and-backs-letter"));
    assert!(artifact.filename.ends_with(".pdf"));
    assert!(artifact.report.failures.is_empty());

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    // Front page: A at slot 0, B at slot 4 (PDF origin bottom-left)
    let front = clip_rects(&page_ops(&doc, 1));
    assert_eq!(front[0], vec![27.0, 531.0, 180.0, 252.0]);
    assert_eq!(front[1], vec![216.0, 270.0, 180.0, 252.0]);

    // Back page: C lands at slot 2, the mirror of slot 0
    assert_eq!(mirrored_index(PaperLayout::Letter3x3, 0), Some(2));
    let back = clip_rects(&page_ops(&doc, 2));
    assert_eq!(back, vec![vec![405.0, 531.0, 180.0, 252.0]]);

    assert_eq!(artifact.report.pages[0].placed, vec![0, 4]);
    assert_eq!(artifact.report.pages[1].placed, vec![2]);
}

#[test]
fn pdf_both_without_backs_is_one_page() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    let artifact = session
        .request_export(ExportMode::Both, ExportFormat::Pdf)
        .unwrap();
    let doc = Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

// =============================================================================
// Capacity switch
// =============================================================================

#[test]
fn layout_switch_hides_but_keeps_slots() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    session.on_file_dropped(solid_png(GREEN), "b.png", 3).unwrap();

    session.on_layout_changed(PaperLayout::Photo4x6);
    assert_eq!(session.get_placed_count(), 1);

    let artifact = session
        .request_export(ExportMode::Front, ExportFormat::Png)
        .unwrap();
    let img = image::load_from_memory(&artifact.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (1200, 1800));
    assert_eq!(artifact.report.pages[0].placed, vec![0]);

    session.on_layout_changed(PaperLayout::Letter3x3);
    assert_eq!(session.get_placed_count(), 2);
}

// =============================================================================
// PNG physical resolution
// =============================================================================

#[test]
fn png_declares_300_dpi_with_valid_crc() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    let artifact = session
        .request_export(ExportMode::Front, ExportFormat::Png)
        .unwrap();
    let bytes = &artifact.bytes;
    assert_eq!(artifact.mime_type, "image/png");
    assert!(artifact.filename.contains("300dpi"));

    // signature (8) + IHDR chunk (4 + 4 + 13 + 4) puts pHYs at offset 33
    assert_eq!(&bytes[12..16], b"IHDR");
    let at = 33;
    let len = u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap()) as usize;
    assert_eq!(len, 9);
    assert_eq!(&bytes[at + 4..at + 8], b"pHYs");

    let data = &bytes[at + 8..at + 17];
    let ppm_x = u32::from_be_bytes(data[0..4].try_into().unwrap());
    let ppm_y = u32::from_be_bytes(data[4..8].try_into().unwrap());
    assert!((11810..=11812).contains(&ppm_x));
    assert_eq!(ppm_x, ppm_y);
    assert_eq!(data[8], 1, "unit must be meters");

    let stored = u32::from_be_bytes(bytes[at + 17..at + 21].try_into().unwrap());
    assert_eq!(stored, reference_crc(&bytes[at + 4..at + 17]));

    // Only one pHYs in the file
    let count = bytes.windows(4).filter(|w| *w == b"pHYs").count();
    assert_eq!(count, 1);
}

#[test]
fn png_both_is_rejected() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    assert!(session.on_back_image_provided(0, solid_png(BLUE)));
    assert!(matches!(
        session.request_export(ExportMode::Both, ExportFormat::Png),
        Err(ExportError::UnsupportedMode { .. })
    ));
}

// =============================================================================
// Partial failure
// =============================================================================

#[test]
fn undecodable_image_leaves_blank_cell() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    let corrupt = ImageSource::from_bytes(b"definitely not an image".to_vec()).unwrap();
    session.on_file_dropped(corrupt, "broken.png", 1).unwrap();
    session.on_file_dropped(solid_png(BLUE), "c.png", 2).unwrap();

    let artifact = session
        .request_export(ExportMode::Front, ExportFormat::Png)
        .unwrap();
    assert_eq!(artifact.report.pages[0].placed, vec![0, 2]);
    assert_eq!(artifact.report.failures.len(), 1);
    assert_eq!(artifact.report.failures[0].slot, 1);

    let img = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
    // cell centers on row 0 at 300 DPI
    assert!(close(*img.get_pixel(487, 562), RED));
    assert!(close(*img.get_pixel(1275, 562), [255, 255, 255]));
    assert!(close(*img.get_pixel(2062, 562), BLUE));
}

#[test]
fn undecodable_image_pdf_still_completes() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    let corrupt = ImageSource::from_bytes(b"garbage".to_vec()).unwrap();
    session.on_file_dropped(corrupt, "broken.png", 4).unwrap();

    let artifact = session
        .request_export(ExportMode::Front, ExportFormat::Pdf)
        .unwrap();
    assert_eq!(artifact.report.pages[0].placed, vec![0]);
    let doc = Document::load_mem(&artifact.bytes).unwrap();
    let draws = page_ops(&doc, 1)
        .iter()
        .filter(|o| o.operator == "Do")
        .count();
    assert_eq!(draws, 1);
}

// =============================================================================
// Cascade deletion
// =============================================================================

#[test]
fn removing_library_image_clears_slots_and_backs() {
    let mut session = Session::default();
    let a = session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    session.on_image_placed(a, 5).unwrap();
    session.on_back_image_provided(5, solid_png(BLUE));
    assert_eq!(session.get_placed_count(), 2);

    session.remove_image(a).unwrap();
    assert_eq!(session.get_placed_count(), 0);
    assert!(!session.get_has_backs());
    assert!(matches!(
        session.request_export(ExportMode::Front, ExportFormat::Pdf),
        Err(ExportError::NoCardsPlaced)
    ));
}

#[test]
fn back_only_export_requires_backs() {
    let mut session = Session::default();
    session.on_file_dropped(solid_png(RED), "a.png", 0).unwrap();
    assert!(matches!(
        session.request_export(ExportMode::Back, ExportFormat::Pdf),
        Err(ExportError::NoBacksAvailable)
    ));
}
