//! The interactive session: the calls a UI makes into the sheet engine.
//!
//! [`Session`] owns the current [`SessionState`] and its history. Each
//! successful mutation pushes the previous state onto the undo stack. States
//! are immutable and share image bytes through `Arc`, so a history entry
//! costs a few pointers per slot.
//!
//! | UI event | Method |
//! |---|---|
//! | image dropped on a slot | [`Session::on_file_dropped`] |
//! | library image dragged to a slot | [`Session::on_image_placed`] |
//! | back image supplied after the prompt | [`Session::on_back_image_provided`] |
//! | paper size switched | [`Session::on_layout_changed`] |
//! | export button | [`Session::request_export`] |
//! | button enablement | [`Session::get_placed_count`], [`Session::get_has_backs`] |

use crate::export::{self, ExportArtifact, ExportError, ExportFormat, ExportMode, ExportOptions};
use crate::geometry::PaperLayout;
use crate::imaging::ImageSource;
use crate::sheet::{BackPolicy, ImageId, SessionState, SheetError};

/// Undo levels kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    undo_stack: Vec<SessionState>,
    redo_stack: Vec<SessionState>,
    /// Maximum number of undo levels (0 = unlimited).
    max_levels: usize,
    export_options: ExportOptions,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}

impl Session {
    pub fn new(state: SessionState) -> Self {
        Self {
            state,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels: DEFAULT_HISTORY_LIMIT,
            export_options: ExportOptions::default(),
        }
    }

    pub fn with_history_limit(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Replace the current state, recording the old one for undo.
    fn commit(&mut self, next: SessionState) {
        let previous = std::mem::replace(&mut self.state, next);
        self.undo_stack.push(previous);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    // =========================================================================
    // Library
    // =========================================================================

    /// Add an upload to the library.
    pub fn add_image(&mut self, source: ImageSource, display_name: impl Into<String>) -> ImageId {
        let (next, id) = self.state.add_to_library(source, display_name);
        self.commit(next);
        id
    }

    pub fn remove_image(&mut self, id: ImageId) -> Result<(), SheetError> {
        let next = self.state.remove_from_library(id)?;
        self.commit(next);
        Ok(())
    }

    // =========================================================================
    // Collaborator boundary
    // =========================================================================

    /// Place a library image. Fails only for an out-of-range slot or an
    /// unknown image.
    pub fn on_image_placed(&mut self, id: ImageId, slot: usize) -> Result<(), SheetError> {
        let next = self.state.place(id, slot)?;
        self.commit(next);
        tracing::debug!(%id, slot, "image placed");
        Ok(())
    }

    /// A file dropped straight onto a slot. Reuses a library entry with
    /// identical bytes, otherwise adds one, then places it.
    ///
    /// The library addition and the placement form a single undo step.
    pub fn on_file_dropped(
        &mut self,
        source: ImageSource,
        display_name: impl Into<String>,
        slot: usize,
    ) -> Result<ImageId, SheetError> {
        let (with_image, id) = match self.state.find_by_content(&source) {
            Some(existing) => (self.state.clone(), existing.id),
            None => self.state.add_to_library(source, display_name),
        };
        let next = with_image.place(id, slot)?;
        self.commit(next);
        Ok(id)
    }

    /// Attach a back image. Returns `false` (and changes nothing) when the
    /// slot has no front image or is out of range.
    pub fn on_back_image_provided(&mut self, slot: usize, source: ImageSource) -> bool {
        match self.state.set_back(slot, source) {
            Ok(next) => {
                self.commit(next);
                true
            }
            Err(e) => {
                tracing::debug!(slot, error = %e, "back image ignored");
                false
            }
        }
    }

    /// Switch paper size. Slot data is never cleared.
    pub fn on_layout_changed(&mut self, layout: PaperLayout) {
        if layout != self.state.layout() {
            let next = self.state.with_layout(layout);
            self.commit(next);
        }
    }

    pub fn set_border(&mut self, border: bool) {
        if border != self.state.border() {
            let next = self.state.with_border(border);
            self.commit(next);
        }
    }

    pub fn set_back_policy(&mut self, policy: BackPolicy) {
        if policy != self.state.back_policy() {
            let next = self.state.with_back_policy(policy);
            self.commit(next);
        }
    }

    pub fn remove_slot(&mut self, slot: usize) -> Result<(), SheetError> {
        let next = self.state.remove(slot)?;
        self.commit(next);
        Ok(())
    }

    pub fn clear_all(&mut self, confirmed: bool) -> Result<(), SheetError> {
        let next = self.state.clear_all(confirmed)?;
        self.commit(next);
        Ok(())
    }

    pub fn request_export(
        &self,
        mode: ExportMode,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ExportError> {
        export::request_export(&self.state, mode, format, &self.export_options)
    }

    pub fn get_placed_count(&self) -> usize {
        self.state.placed_count()
    }

    pub fn get_has_backs(&self) -> bool {
        self.state.has_any_back()
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back one mutation. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.state, previous);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone mutation.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.state, next);
                self.undo_stack.push(current);
                true
            }
            None => false,
        }
    }
}
