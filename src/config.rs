//! Tool configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a `config.toml` in the working directory (or the file
//! passed with `--config`) overrides them key by key. A sheet plan may then
//! override `layout` and `border` for a single run.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [sheet]
//! layout = "letter"          # "letter" (3x3 on 8.5x11) or "photo-4x6" (1x1 on 4x6)
//! border = false             # black fill behind the card grid
//! overwrite_back = "keep"    # "keep" or "clear": back image when a front is replaced
//!
//! [export]
//! output_dir = "."           # where exported files are written
//! filename_prefix = "trading-cards"
//!
//! [preview]
//! screen_dpi = 96            # pixel density of the on-screen grid
//!
//! [processing]
//! max_processes = 4          # Max parallel decode workers (omit for auto = CPU cores)
//! ```
//!
//! Export resolution is not configurable: PNG export is always 300 DPI.
//!
//! Unknown keys are rejected to catch typos early.

use crate::export::{DEFAULT_FILENAME_PREFIX, ExportOptions};
use crate::geometry::{PaperLayout, SCREEN_DPI};
use crate::sheet::{BackPolicy, SessionState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    /// Initial sheet settings.
    pub sheet: SheetSettings,
    /// Where and how exports are written.
    pub export: ExportConfig,
    /// On-screen grid rendering.
    pub preview: PreviewConfig,
    /// Parallel decoding settings.
    pub processing: ProcessingConfig,
}

impl SheetConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(24..=600).contains(&self.preview.screen_dpi) {
            return Err(ConfigError::Validation(
                "preview.screen_dpi must be 24-600".into(),
            ));
        }
        let prefix = &self.export.filename_prefix;
        if prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.filename_prefix must not be empty".into(),
            ));
        }
        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "export.filename_prefix must not contain path separators".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Fresh session state carrying the configured sheet settings.
    pub fn initial_state(&self) -> SessionState {
        SessionState::new(self.sheet.layout)
            .with_border(self.sheet.border)
            .with_back_policy(self.sheet.overwrite_back)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            filename_prefix: self.export.filename_prefix.clone(),
        }
    }
}

/// Sheet settings a session starts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetSettings {
    pub layout: PaperLayout,
    /// Solid black fill behind the grid.
    pub border: bool,
    /// What happens to a back image when its front is replaced.
    pub overwrite_back: BackPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    /// First part of every exported filename.
    pub filename_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub screen_dpi: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            screen_dpi: SCREEN_DPI,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// `SheetConfig::default()` as a TOML table: the bottom layer every
/// `config.toml` is merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SheetConfig::default()).expect("default config must serialize")
}

/// Deep-merge `overlay` onto `base`.
///
/// Tables merge key by key, recursively. Any other overlay value replaces the
/// base value outright. Base keys the overlay does not mention survive.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value.
pub fn load_raw_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// A missing file is `Ok(None)`; a file that fails to parse is an error.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    load_raw_file(&config_path).map(Some)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SheetConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SheetConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// The file is optional. Values it sets override stock defaults; unknown
/// keys and out-of-range values are errors.
pub fn load_config(dir: &Path) -> Result<SheetConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Load config from an explicit file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<SheetConfig, ConfigError> {
    resolve_config(stock_defaults_value(), Some(load_raw_file(path)?))
}

/// Documented stock `config.toml`, printed by `cardsheet gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Card Sheet Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the directory you run cardsheet from,
# or pass it explicitly with --config.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Sheet
# ---------------------------------------------------------------------------
[sheet]
# Paper layout:
#   "letter"    - 3x3 cards on US letter (8.5in x 11in)
#   "photo-4x6" - one card on a 4in x 6in photo print
# Cards are always 2.5in x 3.5in with a 0.125in gap.
layout = "letter"

# Draw a solid black fill behind the card grid, so trimming slightly off the
# cut marks does not leave white slivers.
border = false

# When a new front image replaces an occupied slot:
#   "keep"  - keep the slot's back image
#   "clear" - drop the slot's back image too
overwrite_back = "keep"

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Directory exported PDF and PNG files are written to.
output_dir = "."

# Exported files are named
#   <prefix>-<fronts|backs|fronts-and-backs>-<layout>-<date>-<time>.pdf
#   <prefix>-<fronts|backs>-<layout>-300dpi-<date>-<time>.png
filename_prefix = "trading-cards"

# ---------------------------------------------------------------------------
# On-screen preview
# ---------------------------------------------------------------------------
[preview]
# Pixel density used to lay out the interactive grid.
screen_dpi = 96

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-decoding workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
