// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player settings: time scaling and fixed stepping, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Upper bound of the time scale
pub const MAX_TIME_SCALE: f32 = 10.0;

/// How a player turns host frame time into steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Format version
    pub version: u32,
    /// Multiplier applied to host delta time, 0 to 10
    pub time_scale: f32,
    /// Step length in seconds; `None` steps once per update
    pub fixed_timestep: Option<f64>,
    /// Maximum fixed steps run by a single update
    pub max_steps_per_update: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            time_scale: 1.0,
            fixed_timestep: None,
            max_steps_per_update: 8,
        }
    }
}

impl PlayerSettings {
    /// Settings stepping at a fixed rate
    pub fn fixed(timestep: f64) -> Self {
        Self {
            fixed_timestep: Some(timestep),
            ..Self::default()
        }
    }

    /// Set time scale (clamped to a reasonable range)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(0.0, MAX_TIME_SCALE);
    }

    /// Host delta time scaled by the time scale
    pub fn scaled_delta(&self, delta: f64) -> f64 {
        delta * f64::from(self.time_scale.clamp(0.0, MAX_TIME_SCALE))
    }

    /// Parse from RON, rejecting newer format versions
    pub fn from_ron(content: &str) -> Result<Self, SettingsError> {
        let settings: PlayerSettings = ron::from_str(content)?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        Ok(settings)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content)?;
        tracing::debug!("Loaded player settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::debug!("Saved player settings to {:?}", path);
        Ok(())
    }
}

/// Error loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content is not valid settings RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be written as RON
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}
