//! The sheet model: which image sits in which slot.
//!
//! [`SessionState`] is an immutable value holding everything a session knows:
//! the image library, the front and back slot arrays, the active paper layout
//! and the border flag. Every mutation takes `&self` and returns a new state,
//! so callers can keep old states around (undo) and exporters can read a
//! state without worrying about it changing underneath them.
//!
//! ## Invariants
//!
//! - **Library ownership**: a front slot holds a shared reference to a
//!   library entry. Removing the entry from the library clears every slot
//!   that references it.
//! - **Fixed capacity**: both slot arrays always have [`SLOT_COUNT`] entries.
//!   Switching layout changes which indices are addressable but never clears
//!   data beyond the new capacity.
//! - **Backs follow fronts**: a back image exists only alongside a front.
//!   Clearing a front clears its back.

use crate::geometry::{PaperLayout, SLOT_COUNT};
use crate::imaging::ImageSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("slot {index} is outside the {capacity}-slot layout")]
    InvalidSlotIndex { index: usize, capacity: usize },
    #[error("slot {index} has no front image")]
    EmptySlot { index: usize },
    #[error("image {0} is not in the library")]
    UnknownImage(ImageId),
    #[error("clearing the sheet requires confirmation")]
    ConfirmationRequired,
}

/// Stable identifier of a library image for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl ImageId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An uploaded image available for placement.
#[derive(Debug)]
pub struct CardImage {
    pub id: ImageId,
    pub source: ImageSource,
    pub display_name: String,
    /// SHA-256 of the source bytes, computed once when the image is added.
    pub content_hash: String,
}

/// What happens to an attached back image when its front is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackPolicy {
    /// Keep the existing back; only the front changes.
    #[default]
    Keep,
    /// Drop the existing back along with the old front.
    Clear,
}

/// Two parallel fixed-length slot arrays.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    front: [Option<Arc<CardImage>>; SLOT_COUNT],
    back: [Option<ImageSource>; SLOT_COUNT],
}

impl Sheet {
    pub fn front(&self, index: usize) -> Option<&Arc<CardImage>> {
        self.front.get(index)?.as_ref()
    }

    pub fn back(&self, index: usize) -> Option<&ImageSource> {
        self.back.get(index)?.as_ref()
    }
}

/// Complete session state. Cheap to clone: images are reference-counted.
#[derive(Debug, Clone)]
pub struct SessionState {
    library: Vec<Arc<CardImage>>,
    next_id: u64,
    sheet: Sheet,
    layout: PaperLayout,
    border: bool,
    back_policy: BackPolicy,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(PaperLayout::default())
    }
}

impl SessionState {
    pub fn new(layout: PaperLayout) -> Self {
        Self {
            library: Vec::new(),
            next_id: 1,
            sheet: Sheet::default(),
            layout,
            border: false,
            back_policy: BackPolicy::default(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn layout(&self) -> PaperLayout {
        self.layout
    }

    pub fn border(&self) -> bool {
        self.border
    }

    pub fn back_policy(&self) -> BackPolicy {
        self.back_policy
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn library(&self) -> &[Arc<CardImage>] {
        &self.library
    }

    pub fn find_image(&self, id: ImageId) -> Option<&Arc<CardImage>> {
        self.library.iter().find(|img| img.id == id)
    }

    /// Library entry whose bytes are identical to `source`, if any.
    pub fn find_by_content(&self, source: &ImageSource) -> Option<&Arc<CardImage>> {
        let digest = source.content_hash();
        self.library.iter().find(|img| img.content_hash == digest)
    }

    /// Front image at `index`, only if addressable under the active layout.
    pub fn front(&self, index: usize) -> Option<&Arc<CardImage>> {
        self.layout
            .contains(index)
            .then(|| self.sheet.front(index))
            .flatten()
    }

    /// Back image at `index`, only if addressable under the active layout.
    pub fn back(&self, index: usize) -> Option<&ImageSource> {
        self.layout
            .contains(index)
            .then(|| self.sheet.back(index))
            .flatten()
    }

    /// Occupied front slots within the active layout.
    pub fn placed_count(&self) -> usize {
        (0..self.layout.capacity())
            .filter(|&i| self.front(i).is_some())
            .count()
    }

    /// Whether any addressable slot has a back image.
    pub fn has_any_back(&self) -> bool {
        (0..self.layout.capacity()).any(|i| self.back(i).is_some())
    }

    fn check_index(&self, index: usize) -> Result<(), SheetError> {
        if self.layout.contains(index) {
            Ok(())
        } else {
            Err(SheetError::InvalidSlotIndex {
                index,
                capacity: self.layout.capacity(),
            })
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Switch paper layout. Slot data beyond the new capacity is retained.
    pub fn with_layout(&self, layout: PaperLayout) -> Self {
        Self {
            layout,
            ..self.clone()
        }
    }

    pub fn with_border(&self, border: bool) -> Self {
        Self {
            border,
            ..self.clone()
        }
    }

    pub fn with_back_policy(&self, back_policy: BackPolicy) -> Self {
        Self {
            back_policy,
            ..self.clone()
        }
    }

    // =========================================================================
    // Library
    // =========================================================================

    /// Add an upload to the library and return its new id.
    pub fn add_to_library(
        &self,
        source: ImageSource,
        display_name: impl Into<String>,
    ) -> (Self, ImageId) {
        let id = ImageId(self.next_id);
        let mut next = self.clone();
        let content_hash = source.content_hash();
        next.library.push(Arc::new(CardImage {
            id,
            source,
            display_name: display_name.into(),
            content_hash,
        }));
        next.next_id += 1;
        (next, id)
    }

    /// Remove a library entry and clear every slot that references it.
    pub fn remove_from_library(&self, id: ImageId) -> Result<Self, SheetError> {
        if self.find_image(id).is_none() {
            return Err(SheetError::UnknownImage(id));
        }
        let mut next = self.clone();
        next.library.retain(|img| img.id != id);
        // All nine entries, not just the addressable ones: no dangling references anywhere.
        for index in 0..SLOT_COUNT {
            if next.sheet.front[index]
                .as_ref()
                .is_some_and(|img| img.id == id)
            {
                next.sheet.front[index] = None;
                next.sheet.back[index] = None;
            }
        }
        Ok(next)
    }

    // =========================================================================
    // Slot mutations
    // =========================================================================

    /// Place a library image on the front sheet, replacing any previous front.
    ///
    /// An existing back at `index` is kept or cleared per [`BackPolicy`].
    pub fn place(&self, id: ImageId, index: usize) -> Result<Self, SheetError> {
        self.check_index(index)?;
        let image = self
            .find_image(id)
            .cloned()
            .ok_or(SheetError::UnknownImage(id))?;
        let mut next = self.clone();
        let replacing = next.sheet.front[index].is_some();
        next.sheet.front[index] = Some(image);
        if replacing && self.back_policy == BackPolicy::Clear {
            next.sheet.back[index] = None;
        }
        Ok(next)
    }

    /// Attach a back image behind the front at `index`.
    pub fn set_back(&self, index: usize, source: ImageSource) -> Result<Self, SheetError> {
        self.check_index(index)?;
        if self.sheet.front[index].is_none() {
            return Err(SheetError::EmptySlot { index });
        }
        let mut next = self.clone();
        next.sheet.back[index] = Some(source);
        Ok(next)
    }

    /// Clear the front and back at `index`.
    pub fn remove(&self, index: usize) -> Result<Self, SheetError> {
        self.check_index(index)?;
        let mut next = self.clone();
        next.sheet.front[index] = None;
        next.sheet.back[index] = None;
        Ok(next)
    }

    /// Reset both slot arrays. Destructive, so the caller must pass the
    /// user's confirmation. The library and settings are kept.
    pub fn clear_all(&self, confirmed: bool) -> Result<Self, SheetError> {
        if !confirmed {
            return Err(SheetError::ConfirmationRequired);
        }
        Ok(Self {
            sheet: Sheet::default(),
            ..self.clone()
        })
    }
}
