//! CLI output formatting.
//!
//! Output is **slot-centric**: every line about a card starts with its
//! 1-based slot number, zero-padded to three digits, so the same card reads
//! the same way in `check`, `export`, and the on-screen grid. Details are
//! indented underneath.
//!
//! ## Check
//!
//! ```text
//! Sheet: Letter 8.5" × 11" (3×3)
//!     Border: off
//!     Replaced fronts keep their back
//! Fronts (2 of 9)
//!     001 a.png (has back)
//!     005 b.png
//!
//! Images
//!     a.png 750x1050 (48213 bytes)
//!     back of 001 750x1050 (50211 bytes)
//!     b.png unreadable: Decode failed: ...
//! ```
//!
//! ## Export
//!
//! ```text
//! Exported fronts-and-backs as PDF, Letter 8.5" × 11" (3×3)
//!     front page: 001 005
//!     back page: 003
//!     failed: front 005 (Decode failed: ...)
//! Wrote ./trading-cards-fronts-and-backs-letter-2026-10-19-142501.pdf (210433 bytes)
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::export::ExportArtifact;
use crate::geometry::SLOT_COUNT;
use crate::imaging::{BackendError, Dimensions};
use crate::sheet::{BackPolicy, SessionState};
use std::path::Path;

/// Format a 0-based slot index as a 3-digit, 1-based label.
fn slot_label(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn slot_list(slots: &[usize]) -> String {
    if slots.is_empty() {
        return "(none)".to_string();
    }
    slots
        .iter()
        .map(|&s| slot_label(s))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Sheet summary
// ============================================================================

pub fn format_sheet_summary(state: &SessionState) -> Vec<String> {
    let layout = state.layout();
    let mut lines = vec![format!("Sheet: {}", layout.label())];
    lines.push(format!(
        "{}Border: {}",
        indent(1),
        if state.border() { "on" } else { "off" }
    ));
    lines.push(format!(
        "{}{}",
        indent(1),
        match state.back_policy() {
            BackPolicy::Keep => "Replaced fronts keep their back",
            BackPolicy::Clear => "Replaced fronts drop their back",
        }
    ));

    lines.push(format!(
        "Fronts ({} of {})",
        state.placed_count(),
        layout.capacity()
    ));
    for index in 0..layout.capacity() {
        if let Some(card) = state.front(index) {
            let back = if state.back(index).is_some() {
                " (has back)"
            } else {
                ""
            };
            lines.push(format!(
                "{}{} {}{}",
                indent(1),
                slot_label(index),
                card.display_name,
                back
            ));
        }
    }

    // Slots retained from a larger layout are kept but not addressable.
    let hidden: Vec<String> = (layout.capacity()..SLOT_COUNT)
        .filter_map(|i| {
            state
                .sheet()
                .front(i)
                .map(|card| format!("{} {}", slot_label(i), card.display_name))
        })
        .collect();
    if !hidden.is_empty() {
        lines.push(format!("Outside this layout ({})", hidden.len()));
        lines.extend(hidden.into_iter().map(|h| format!("{}{}", indent(1), h)));
    }
    lines
}

pub fn print_sheet_summary(state: &SessionState) {
    for line in format_sheet_summary(state) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// One image inspected by `check`.
#[derive(Debug, Clone)]
pub struct CheckEntry {
    pub label: String,
    pub bytes: usize,
    pub result: Result<Dimensions, BackendError>,
}

pub fn format_check(state: &SessionState, entries: &[CheckEntry]) -> Vec<String> {
    let mut lines = format_sheet_summary(state);
    lines.push(String::new());
    lines.push("Images".to_string());
    for entry in entries {
        let line = match &entry.result {
            Ok(d) => format!(
                "{}{} {}x{} ({} bytes)",
                indent(1),
                entry.label,
                d.width,
                d.height,
                entry.bytes
            ),
            Err(e) => format!("{}{} unreadable: {}", indent(1), entry.label, e),
        };
        lines.push(line);
    }
    let unreadable = entries.iter().filter(|e| e.result.is_err()).count();
    if unreadable > 0 {
        lines.push(format!(
            "{} of {} images cannot be decoded and will export as blank cells",
            unreadable,
            entries.len()
        ));
    }
    lines
}

pub fn print_check(state: &SessionState, entries: &[CheckEntry]) {
    for line in format_check(state, entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

pub fn format_export_report(artifact: &ExportArtifact, written_to: &Path) -> Vec<String> {
    let report = &artifact.report;
    let mut lines = vec![format!(
        "Exported {} as {}, {}",
        report.mode.filename_part(),
        report.format,
        report.layout.label()
    )];
    for page in &report.pages {
        lines.push(format!(
            "{}{} page: {}",
            indent(1),
            page.side,
            slot_list(&page.placed)
        ));
    }
    for failure in &report.failures {
        lines.push(format!(
            "{}failed: {} {} ({})",
            indent(1),
            failure.side,
            slot_label(failure.slot),
            failure.reason
        ));
    }
    lines.push(format!(
        "Wrote {} ({} bytes)",
        written_to.display(),
        artifact.bytes.len()
    ));
    lines
}

pub fn print_export_report(artifact: &ExportArtifact, written_to: &Path) {
    for line in format_export_report(artifact, written_to) {
        println!("{}", line);
    }
}

/// One-line confirmation for commands that write a single file.
pub fn format_written(what: &str, path: &Path, bytes: usize) -> String {
    format!("Wrote {} {} ({} bytes)", what, path.display(), bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{
        EmbedFailure, ExportFormat, ExportMode, ExportReport, PageReport,
    };
    use crate::geometry::PaperLayout;
    use crate::imaging::ImageSource;
    use crate::render::Side;

    fn src(tag: &str) -> ImageSource {
        ImageSource::from_bytes(tag.as_bytes().to_vec()).unwrap()
    }

    fn state_with(cards: &[(&str, usize)]) -> SessionState {
        let mut state = SessionState::default();
        for (name, slot) in cards {
            let (next, id) = state.add_to_library(src(name), *name);
            state = next.place(id, *slot).unwrap();
        }
        state
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn slot_label_is_one_based() {
        assert_eq!(slot_label(0), "001");
        assert_eq!(slot_label(8), "009");
    }

    #[test]
    fn slot_list_empty() {
        assert_eq!(slot_list(&[]), "(none)");
        assert_eq!(slot_list(&[0, 4]), "001 005");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Sheet summary
    // =========================================================================

    #[test]
    fn summary_lists_fronts_with_back_marker() {
        let state = state_with(&[("a.png", 0), ("b.png", 4)])
            .set_back(0, src("c"))
            .unwrap();
        let lines = format_sheet_summary(&state);
        assert!(lines[0].starts_with("Sheet: Letter"));
        assert_eq!(lines[1], "    Border: off");
        assert!(lines.contains(&"Fronts (2 of 9)".to_string()));
        assert!(lines.contains(&"    001 a.png (has back)".to_string()));
        assert!(lines.contains(&"    005 b.png".to_string()));
    }

    #[test]
    fn summary_shows_cards_outside_layout() {
        let state = state_with(&[("a.png", 0), ("b.png", 3)]).with_layout(PaperLayout::Photo4x6);
        let lines = format_sheet_summary(&state);
        assert!(lines.contains(&"Fronts (1 of 1)".to_string()));
        assert!(lines.contains(&"Outside this layout (1)".to_string()));
        assert!(lines.contains(&"    004 b.png".to_string()));
    }

    #[test]
    fn summary_reports_policy() {
        let state = SessionState::default().with_back_policy(BackPolicy::Clear);
        let lines = format_sheet_summary(&state);
        assert_eq!(lines[2], "    Replaced fronts drop their back");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_lists_dimensions_and_failures() {
        let state = state_with(&[("a.png", 0)]);
        let entries = vec![
            CheckEntry {
                label: "a.png".into(),
                bytes: 120,
                result: Ok(Dimensions {
                    width: 750,
                    height: 1050,
                }),
            },
            CheckEntry {
                label: "bad.png".into(),
                bytes: 3,
                result: Err(BackendError::Decode("corrupt".into())),
            },
        ];
        let lines = format_check(&state, &entries);
        assert!(lines.contains(&"    a.png 750x1050 (120 bytes)".to_string()));
        assert!(lines.contains(&"    bad.png unreadable: Decode failed: corrupt".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "1 of 2 images cannot be decoded and will export as blank cells"
        );
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn export_report_lines() {
        let artifact = ExportArtifact {
            bytes: vec![0; 42],
            filename: "cards.pdf".into(),
            mime_type: "application/pdf",
            report: ExportReport {
                format: ExportFormat::Pdf,
                mode: ExportMode::Both,
                layout: PaperLayout::Letter3x3,
                pages: vec![
                    PageReport {
                        side: Side::Front,
                        placed: vec![0],
                    },
                    PageReport {
                        side: Side::Back,
                        placed: vec![2],
                    },
                ],
                failures: vec![EmbedFailure {
                    side: Side::Front,
                    slot: 4,
                    source_slot: 4,
                    reason: "Decode failed: x".into(),
                }],
            },
        };
        let lines = format_export_report(&artifact, Path::new("out/cards.pdf"));
        assert!(lines[0].starts_with("Exported fronts-and-backs as PDF, Letter"));
        assert_eq!(lines[1], "    front page: 001");
        assert_eq!(lines[2], "    back page: 003");
        assert_eq!(lines[3], "    failed: front 005 (Decode failed: x)");
        assert_eq!(lines[4], "Wrote out/cards.pdf (42 bytes)");
    }

    #[test]
    fn written_line() {
        assert_eq!(
            format_written("preview", Path::new("p.html"), 10),
            "Wrote preview p.html (10 bytes)"
        );
    }
}
