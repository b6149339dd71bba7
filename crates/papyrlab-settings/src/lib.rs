//! PapyrLab Settings Crate
//!
//! Handles user configuration: working-area defaults, display toggles, score
//! tier thresholds and the recent project list.

pub mod config;
pub mod error;

pub use config::{
    AlignmentSettings, Config, DisplaySettings, WorkingAreaSettings, DEFAULT_DPI,
    MAX_RECENT_FILES,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
