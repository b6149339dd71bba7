//! Configuration for PapyrLab
//!
//! Supports JSON and TOML files, chosen by extension. Configuration is
//! organized into sections:
//! - Working area (resolution and default canvas size)
//! - Display toggles (borders, ids, column grid)
//! - Alignment (score tiers, packing margin)
//! - Recent projects

use crate::error::{ConfigError, SettingsError, SettingsResult};
use papyrlab_core::units::{centimeters_to_pixels, pixels_to_centimeters};
use papyrlab_core::WorkingArea;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolution assumed for fragment scans.
pub const DEFAULT_DPI: u32 = 300;

/// Length of the recent project list.
pub const MAX_RECENT_FILES: usize = 10;

const DEFAULT_WIDTH_CM: f64 = 100.0;
const DEFAULT_HEIGHT_CM: f64 = 50.0;

/// Working area settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingAreaSettings {
    /// Dots per inch of the scans
    pub dpi: u32,
    /// Default canvas width in pixels
    pub width_px: u32,
    /// Default canvas height in pixels
    pub height_px: u32,
}

impl Default for WorkingAreaSettings {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            width_px: centimeters_to_pixels(DEFAULT_WIDTH_CM, DEFAULT_DPI),
            height_px: centimeters_to_pixels(DEFAULT_HEIGHT_CM, DEFAULT_DPI),
        }
    }
}

impl WorkingAreaSettings {
    pub fn working_area(&self) -> WorkingArea {
        WorkingArea::new(self.width_px, self.height_px)
    }

    /// Size in centimetres as `(width, height)`.
    pub fn size_cm(&self) -> (f64, f64) {
        (
            pixels_to_centimeters(self.width_px, self.dpi),
            pixels_to_centimeters(self.height_px, self.dpi),
        )
    }

    pub fn set_size_cm(&mut self, width_cm: f64, height_cm: f64) {
        self.width_px = centimeters_to_pixels(width_cm, self.dpi);
        self.height_px = centimeters_to_pixels(height_cm, self.dpi);
    }

    /// Changes the resolution and rescales the pixel size so the physical
    /// size stays the same. A zero dpi is ignored.
    pub fn set_dpi(&mut self, dpi: u32) {
        if dpi == 0 || self.dpi == 0 {
            return;
        }
        let rescale = |px: u32| (px as u64 * dpi as u64 / self.dpi as u64).min(u32::MAX as u64) as u32;
        self.width_px = rescale(self.width_px);
        self.height_px = rescale(self.height_px);
        self.dpi = dpi;
    }
}

/// Canvas display toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_ids: bool,
    pub show_grid: bool,
    /// Fragment border width in pixels
    pub border_width: u32,
    pub working_area_border_width: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_ids: true,
            show_grid: false,
            border_width: 3,
            working_area_border_width: 3,
        }
    }
}

/// Alignment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentSettings {
    /// Samples scoring above this are high tier
    pub high_score_threshold: f64,
    /// Samples scoring above this are medium tier
    pub medium_score_threshold: f64,
    /// Extra room added on each axis when an import does not fit
    pub packing_margin: u32,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            high_score_threshold: 0.7,
            medium_score_threshold: 0.4,
            packing_margin: 100,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Most recent first
    pub recent_files: Vec<PathBuf>,
    pub working_area: WorkingAreaSettings,
    pub display: DisplaySettings,
    pub alignment: AlignmentSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/papyrlab/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("papyrlab").join("config.toml"))
            .ok_or_else(|| SettingsError::ConfigDirectory("no configuration directory".to_string()))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or the defaults if it does not exist yet.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let area = &self.working_area;
        if area.dpi == 0 {
            return Err(ConfigError::out_of_range("working_area.dpi", area.dpi));
        }
        if area.width_px == 0 {
            return Err(ConfigError::out_of_range("working_area.width_px", area.width_px));
        }
        if area.height_px == 0 {
            return Err(ConfigError::out_of_range("working_area.height_px", area.height_px));
        }

        let alignment = &self.alignment;
        for (key, value) in [
            ("alignment.high_score_threshold", alignment.high_score_threshold),
            ("alignment.medium_score_threshold", alignment.medium_score_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::out_of_range(key, value));
            }
        }
        if alignment.medium_score_threshold >= alignment.high_score_threshold {
            return Err(ConfigError::out_of_range(
                "alignment.medium_score_threshold",
                alignment.medium_score_threshold,
            ));
        }
        Ok(())
    }

    /// `(high, medium)` score tier thresholds.
    pub fn score_thresholds(&self) -> (f64, f64) {
        (
            self.alignment.high_score_threshold,
            self.alignment.medium_score_threshold,
        )
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|f| f != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Drops recent entries that no longer exist on disk.
    pub fn prune_recent_files(&mut self) {
        self.recent_files.retain(|f| f.exists());
    }
}
