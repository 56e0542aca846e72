//! Sheet-plan files.
//!
//! A plan is a small TOML file describing which image goes in which slot,
//! so a sheet can be built from the command line:
//!
//! ```toml
//! layout = "letter"      # optional; overrides config
//! border = true          # optional; overrides config
//!
//! [[card]]
//! slot = 0
//! front = "images/a.png"
//! back = "images/c.png"  # optional
//! ```
//!
//! Image paths are relative to the plan file's directory. Cards are applied
//! in file order through the same [`Session`] calls an interactive UI makes,
//! so a later card in the same slot replaces an earlier one and identical
//! files share one library entry.

use crate::geometry::PaperLayout;
use crate::imaging::{ImageSource, SourceError};
use crate::session::Session;
use crate::sheet::SheetError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("card {card}: {source}")]
    Sheet {
        card: usize,
        #[source]
        source: SheetError,
    },
    #[error("image not found: {}", .0.display())]
    MissingImage(PathBuf),
    #[error("{}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetPlan {
    pub layout: Option<PaperLayout>,
    pub border: Option<bool>,
    #[serde(default, rename = "card")]
    pub cards: Vec<CardEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardEntry {
    pub slot: usize,
    pub front: PathBuf,
    pub back: Option<PathBuf>,
}

/// Parsed plan plus the directory its image paths are relative to.
#[derive(Debug, Clone)]
pub struct LoadedPlan {
    pub plan: SheetPlan,
    pub base_dir: PathBuf,
}

pub fn load_plan(path: &Path) -> Result<LoadedPlan, PlanError> {
    let content = fs::read_to_string(path)?;
    let plan: SheetPlan = toml::from_str(&content)?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(LoadedPlan { plan, base_dir })
}

fn read_image(base_dir: &Path, rel: &Path) -> Result<ImageSource, PlanError> {
    let path = base_dir.join(rel);
    if !path.is_file() {
        return Err(PlanError::MissingImage(path));
    }
    let bytes = fs::read(&path)?;
    ImageSource::from_bytes(bytes).map_err(|source| PlanError::Source { path, source })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl LoadedPlan {
    /// Apply the plan's settings and cards to `session`.
    ///
    /// Layout is switched before any card is placed, so slot indices are
    /// checked against the plan's layout.
    pub fn apply(&self, session: &mut Session) -> Result<(), PlanError> {
        if let Some(layout) = self.plan.layout {
            session.on_layout_changed(layout);
        }
        if let Some(border) = self.plan.border {
            session.set_border(border);
        }

        for (n, card) in self.plan.cards.iter().enumerate() {
            let front = read_image(&self.base_dir, &card.front)?;
            session
                .on_file_dropped(front, display_name(&card.front), card.slot)
                .map_err(|source| PlanError::Sheet { card: n + 1, source })?;
            tracing::debug!(slot = card.slot, front = %card.front.display(), "card placed");

            if let Some(back_path) = &card.back {
                let back = read_image(&self.base_dir, back_path)?;
                session.on_back_image_provided(card.slot, back);
            }
        }
        Ok(())
    }
}
