//! HTML backends: the interactive grid and the print-preview document.
//!
//! Both are absolutely positioned boxes driven by a [`PagePlan`], so they
//! share placement with the exporters. The grid is laid out in screen pixels,
//! the preview in inches so the browser's print path keeps physical size.
//! Images are inlined as data URIs and drawn with `object-fit: cover`, the
//! same crop-to-fill rule the exporters apply.

use super::{CellPlacement, EmptyCell, PagePlan, SheetPainter, Side, paint, plan_page};
use crate::geometry::{Rect, Segment, Unit};
use crate::sheet::SessionState;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::convert::Infallible;
use std::fmt;

const GRID_CSS: &str = r#"
.sheet { position: relative; background: #fff; box-shadow: 0 1px 4px rgba(0,0,0,.3); }
.sheet > * { position: absolute; box-sizing: border-box; }
.sheet-border { background: #000; }
.slot { overflow: hidden; }
.slot img { width: 100%; height: 100%; object-fit: cover; display: block; }
.slot.empty { border: 1px dashed #bbb; display: flex; align-items: center; justify-content: center; color: #999; font: 600 1.5em sans-serif; }
.has-back { position: absolute; right: 4px; bottom: 4px; padding: 1px 4px; background: rgba(0,0,0,.7); color: #fff; font: 11px sans-serif; border-radius: 3px; }
.cut-mark { background: #000; }
"#;

const PREVIEW_CSS: &str = r#"
body { margin: 0; background: #eee; font: 14px sans-serif; }
.controls { padding: 8px 12px; display: flex; flex-wrap: wrap; gap: 16px; align-items: center; }
.controls h1 { font-size: 16px; margin: 0; }
.controls button { padding: 4px 10px; }
.view-toggle button.active { font-weight: bold; }
.flip-steps { max-width: 32em; margin: 8px auto; padding: 8px 16px; background: #fff; border: 1px solid #999; }
.page { margin: 16px auto; page-break-after: always; break-after: page; }
.page:last-child { page-break-after: auto; break-after: auto; }
.page.hidden { display: none; }
.no-pages { text-align: center; }
@media print {
  body { background: none; }
  .controls, .flip-steps, .no-pages { display: none; }
  .page { margin: 0; box-shadow: none; }
  .page.hidden { display: none !important; }
}
"#;

/// View toggle, per-side printing, and the guided double-sided flow.
///
/// Printing one side hides the other page for the duration of the print
/// dialog and then restores the selected view.
const PREVIEW_JS: &str = r#"
function showOnly(side) {
  document.querySelectorAll('.sheet.page').forEach(function (page) {
    page.classList.toggle('hidden', side !== 'all' && page.dataset.side !== side);
  });
}
function filterView(view) {
  showOnly(view === 'fronts' ? 'front' : view === 'backs' ? 'back' : 'all');
  document.querySelectorAll('.view-toggle button').forEach(function (button) {
    button.classList.toggle('active', button.dataset.view === view);
  });
  document.body.dataset.view = view;
}
function printSide(side) {
  showOnly(side);
  window.print();
  filterView(document.body.dataset.view);
}
function startGuidedPrint() {
  if (!confirm('Step 1 of 2: print the FRONT side now?')) return;
  printSide('front');
  document.getElementById('flip-steps').hidden = false;
}
function finishGuidedPrint() {
  document.getElementById('flip-steps').hidden = true;
  printSide('back');
}
document.querySelectorAll('[data-view]').forEach(function (button) {
  button.addEventListener('click', function () { filterView(button.dataset.view); });
});
document.querySelectorAll('[data-print]').forEach(function (button) {
  button.addEventListener('click', function () { printSide(button.dataset.print); });
});
document.querySelectorAll('[data-guided]').forEach(function (button) {
  button.addEventListener('click', function () {
    if (button.dataset.guided === 'start') startGuidedPrint();
    else if (button.dataset.guided === 'backs') finishGuidedPrint();
    else document.getElementById('flip-steps').hidden = true;
  });
});
"#;

/// Pages shown by the print preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewView {
    #[default]
    All,
    Fronts,
    Backs,
}

impl PreviewView {
    pub const ALL: [PreviewView; 3] = [PreviewView::All, PreviewView::Fronts, PreviewView::Backs];

    fn includes(self, side: Side) -> bool {
        matches!(
            (self, side),
            (PreviewView::All, _) | (PreviewView::Fronts, Side::Front) | (PreviewView::Backs, Side::Back)
        )
    }

    fn label(self) -> &'static str {
        match self {
            PreviewView::All => "All",
            PreviewView::Fronts => "Fronts",
            PreviewView::Backs => "Backs",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            PreviewView::All => "all",
            PreviewView::Fronts => "fronts",
            PreviewView::Backs => "backs",
        }
    }
}

impl fmt::Display for PreviewView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for PreviewView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreviewView::ALL
            .into_iter()
            .find(|v| v.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown preview view '{s}' (expected all, fronts or backs)"))
    }
}

// ============================================================================
// Painter
// ============================================================================

/// Collects positioned boxes for one page.
struct HtmlPainter {
    suffix: &'static str,
    hairline: f64,
    annotate: bool,
    parts: Vec<Markup>,
}

impl HtmlPainter {
    fn new(unit: Unit, annotate: bool) -> Self {
        let (suffix, hairline) = match unit {
            Unit::Inches => ("in", 1.0 / 96.0),
            Unit::Points => ("pt", 0.75),
            Unit::Pixels(_) => ("px", 1.0),
        };
        Self {
            suffix,
            hairline,
            annotate,
            parts: Vec::new(),
        }
    }

    fn len(&self, value: f64) -> String {
        format!("{}{}", trim_float(value), self.suffix)
    }

    fn place(&self, rect: Rect) -> String {
        format!(
            "left:{};top:{};width:{};height:{}",
            self.len(rect.x),
            self.len(rect.y),
            self.len(rect.width),
            self.len(rect.height)
        )
    }
}

/// Format with at most four decimals and no trailing zeros.
fn trim_float(value: f64) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".into() } else { s.to_string() }
}

impl SheetPainter for HtmlPainter {
    type Error = Infallible;

    fn border(&mut self, rect: Rect) -> Result<(), Infallible> {
        let style = self.place(rect);
        self.parts.push(html! { div.sheet-border style=(style) {} });
        Ok(())
    }

    fn cell(&mut self, cell: &CellPlacement<'_>) -> Result<(), Infallible> {
        let style = self.place(cell.rect);
        let alt = cell
            .label
            .map(str::to_string)
            .unwrap_or_else(|| format!("Back of card {}", cell.source_slot + 1));
        let annotate = self.annotate && cell.has_back;
        self.parts.push(html! {
            div.slot data-slot=(cell.slot) style=(style) {
                img src=(cell.image.to_data_uri()) alt=(alt);
                @if annotate {
                    span.has-back { "Has back" }
                }
            }
        });
        Ok(())
    }

    fn empty_cell(&mut self, cell: &EmptyCell) -> Result<(), Infallible> {
        let style = self.place(cell.rect);
        let annotate = self.annotate;
        self.parts.push(html! {
            div.slot.empty data-slot=(cell.slot) style=(style) {
                @if annotate { (cell.slot + 1) }
            }
        });
        Ok(())
    }

    fn cut_mark(&mut self, segment: &Segment) -> Result<(), Infallible> {
        let x = segment.start.x.min(segment.end.x);
        let y = segment.start.y.min(segment.end.y);
        let w = (segment.end.x - segment.start.x).abs().max(self.hairline);
        let h = (segment.end.y - segment.start.y).abs().max(self.hairline);
        let style = self.place(Rect::new(x, y, w, h));
        self.parts.push(html! { div.cut-mark style=(style) {} });
        Ok(())
    }
}

fn render_page(plan: &PagePlan<'_>, annotate: bool, hidden: bool) -> Markup {
    let mut painter = HtmlPainter::new(plan.unit, annotate);
    let Ok(()) = paint(plan, &mut painter);
    let size = format!(
        "width:{};height:{}",
        painter.len(plan.page.width),
        painter.len(plan.page.height)
    );
    html! {
        div.sheet.page.hidden[hidden] data-side=(plan.side.to_string()) style=(size) {
            @for part in &painter.parts {
                (part)
            }
        }
    }
}

// ============================================================================
// Public renderers
// ============================================================================

/// Interactive grid fragment for one side, in screen pixels.
///
/// Empty slots show their 1-based number; front cells with an attached back
/// carry a "Has back" badge.
pub fn render_grid(state: &SessionState, side: Side, screen_dpi: u32) -> Markup {
    let plan = plan_page(state, side, Unit::Pixels(screen_dpi));
    html! {
        style { (PreEscaped(GRID_CSS)) }
        (render_page(&plan, true, false))
    }
}

/// Standalone print-preview document.
///
/// The front page is always present; the back page only when a back image
/// exists. Every page is emitted and `view` only picks which ones start out
/// visible: the inline script switches views, prints one side at a time, and
/// walks through double-sided printing (fronts, flip the sheet, backs).
pub fn render_print_preview(state: &SessionState, view: PreviewView) -> Markup {
    let layout = state.layout();
    let has_backs = state.has_any_back();
    let mut sides = vec![Side::Front];
    if has_backs {
        sides.push(Side::Back);
    }
    let plans: Vec<PagePlan<'_>> = sides
        .into_iter()
        .map(|side| plan_page(state, side, Unit::Inches))
        .collect();
    let nothing_visible = !plans.iter().any(|plan| view.includes(plan.side));
    let page_rule = format!(
        "@page {{ size: {}in {}in; margin: 0; }}",
        trim_float(layout.page_width_in()),
        trim_float(layout.page_height_in())
    );
    let heading = if has_backs {
        "Print preview: 2 pages"
    } else {
        "Print preview: 1 page"
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { "Print preview: " (layout.label()) }
                style { (PreEscaped(GRID_CSS)) (PreEscaped(PREVIEW_CSS)) (PreEscaped(page_rule)) }
            }
            body data-view=(view.slug()) {
                div.controls {
                    h1 { (heading) }
                    @if has_backs {
                        div.view-toggle {
                            @for option in PreviewView::ALL {
                                button type="button" class=[(option == view).then_some("active")]
                                    data-view=(option.slug()) { (option.label()) }
                            }
                        }
                    }
                    div.print-buttons {
                        @if has_backs {
                            button type="button" data-guided="start" { "Guided double-sided print" }
                            button type="button" data-print="front" { "Print fronts only" }
                            button type="button" data-print="back" { "Print backs only" }
                        } @else {
                            button type="button" data-print="front" { "Print front" }
                        }
                    }
                }
                @if has_backs {
                    section #flip-steps.flip-steps hidden {
                        h2 { "Step 2 of 2: print the backs" }
                        ol {
                            li { "Take the printed sheet from the output tray." }
                            li { "Flip it over left to right, like turning a page in a book." }
                            li { "Put it back in the input tray, printed side facing the same way as before." }
                        }
                        button type="button" data-guided="backs" { "Print backs" }
                        button type="button" data-guided="cancel" { "Cancel" }
                    }
                }
                @if nothing_visible {
                    p.no-pages { "Nothing to preview for this view." }
                }
                @for plan in &plans {
                    (render_page(plan, false, !view.includes(plan.side)))
                }
                script { (PreEscaped(PREVIEW_JS)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PaperLayout;
    use crate::imaging::ImageSource;

    fn src(tag: &str) -> ImageSource {
        ImageSource::from_bytes(tag.as_bytes().to_vec()).unwrap()
    }

    fn state_with_back() -> SessionState {
        let (state, a) = SessionState::default().add_to_library(src("A"), "ace.png");
        let state = state.place(a, 0).unwrap();
        state.set_back(0, src("C")).unwrap()
    }

    #[test]
    fn trim_float_formats() {
        assert_eq!(trim_float(0.25), "0.25");
        assert_eq!(trim_float(96.0), "96");
        assert_eq!(trim_float(0.0625), "0.0625");
        assert_eq!(trim_float(-0.0), "0");
    }

    #[test]
    fn preview_view_parses() {
        assert_eq!("Backs".parse::<PreviewView>().unwrap(), PreviewView::Backs);
        assert!("sideways".parse::<PreviewView>().is_err());
    }

    // =========================================================================
    // Grid
    // =========================================================================

    #[test]
    fn grid_positions_in_screen_pixels() {
        let html = render_grid(&state_with_back(), Side::Front, 96).into_string();
        // slot 0 at margin (8.5 - 7.75) / 2 = 0.375in = 36px, (11 - 10.75) / 2 = 0.125in = 12px
        assert!(html.contains("left:36px;top:12px;width:240px;height:336px"));
        assert!(html.contains("width:816px;height:1056px"));
    }

    #[test]
    fn grid_numbers_empty_slots() {
        let html = render_grid(&state_with_back(), Side::Front, 96).into_string();
        assert!(html.contains(r#"data-slot="8""#));
        assert!(html.contains(">9</div>"));
        assert!(!html.contains(">1</div>"));
    }

    #[test]
    fn grid_marks_cards_with_backs() {
        let html = render_grid(&state_with_back(), Side::Front, 96).into_string();
        assert!(html.contains("Has back"));
        assert!(html.contains(r#"alt="ace.png""#));
    }

    #[test]
    fn grid_back_side_is_mirrored() {
        let html = render_grid(&state_with_back(), Side::Back, 96).into_string();
        // back of slot 0 sits at slot 2: 36 + 2 * (240 + 12) = 540px
        assert!(html.contains(r#"data-slot="2" style="left:540px;top:12px;"#));
        assert!(html.contains("Back of card 1"));
    }

    // =========================================================================
    // Print preview
    // =========================================================================

    #[test]
    fn preview_uses_inches_and_page_rule() {
        let html = render_print_preview(&state_with_back(), PreviewView::All).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("@page { size: 8.5in 11in; margin: 0; }"));
        assert!(html.contains("left:0.375in;top:0.125in;width:2.5in;height:3.5in"));
        assert_eq!(html.matches(r#"class="sheet page""#).count(), 2);
    }

    #[test]
    fn preview_emits_every_page_and_hides_by_view() {
        let state = state_with_back();
        let fronts = render_print_preview(&state, PreviewView::Fronts).into_string();
        assert!(fronts.contains(r#"class="sheet page" data-side="front""#));
        assert!(fronts.contains(r#"class="sheet page hidden" data-side="back""#));
        assert!(fronts.contains(r#"data-view="fronts""#));

        let backs = render_print_preview(&state, PreviewView::Backs).into_string();
        assert!(backs.contains(r#"class="sheet page hidden" data-side="front""#));
        assert!(backs.contains(r#"class="sheet page" data-side="back""#));
    }

    #[test]
    fn preview_toggle_switches_in_place() {
        let html = render_print_preview(&state_with_back(), PreviewView::All).into_string();
        for slug in ["all", "fronts", "backs"] {
            assert!(html.contains(&format!(r#"data-view="{slug}""#)));
        }
        assert!(!html.contains("href=\"?view="));
        assert!(html.contains("function filterView(view)"));
        assert!(html.contains("<script>"));
    }

    #[test]
    fn preview_offers_per_side_and_guided_printing() {
        let html = render_print_preview(&state_with_back(), PreviewView::All).into_string();
        assert!(html.contains(r#"data-print="front""#));
        assert!(html.contains(r#"data-print="back""#));
        assert!(html.contains(r#"data-guided="start""#));
        assert!(html.contains("Step 2 of 2: print the backs"));
        assert!(html.contains("Flip it over left to right"));
        assert!(html.contains(r#"data-guided="backs""#));
    }

    #[test]
    fn preview_omits_back_page_without_backs() {
        let (state, a) = SessionState::default().add_to_library(src("A"), "a.png");
        let state = state.place(a, 0).unwrap();
        let html = render_print_preview(&state, PreviewView::All).into_string();
        assert_eq!(html.matches(r#"class="sheet page""#).count(), 1);
        assert!(html.contains("1 page"));
        // no backs: no toggle, no guided flow, no back-only print
        assert!(!html.contains(r#"data-view="backs""#));
        assert!(!html.contains(r#"data-guided="start""#));
        assert!(!html.contains(r#"data-print="back""#));
        assert!(!html.contains("Step 2 of 2"));
        let backs = render_print_preview(&state, PreviewView::Backs).into_string();
        assert!(backs.contains("Nothing to preview"));
    }

    #[test]
    fn preview_draws_border_when_enabled() {
        let state = state_with_back().with_border(true).with_layout(PaperLayout::Photo4x6);
        let html = render_print_preview(&state, PreviewView::Fronts).into_string();
        assert!(html.contains("sheet-border"));
        assert!(html.contains("@page { size: 4in 6in; margin: 0; }"));
    }
}
