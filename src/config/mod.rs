// SPDX-License-Identifier: MPL-2.0
//! This module handles the render configuration, including loading and saving
//! it to a `render.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use tilestitch::config::{self, RenderConfig};
//! use std::path::PathBuf;
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.augmentation = true;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_file = PathBuf::from("./temp_config_dir/render.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert!(loaded.augmentation);
//! ```

pub mod defaults;

use crate::domain::tile::TensorShape;
use crate::domain::Size;
use crate::error::{Error, Result};
use defaults::{
    DEFAULT_AUGMENTATION, DEFAULT_BATCH_SIZE, DEFAULT_OVERLAP_FRACTION, DEFAULT_SCALE_FACTOR,
    DEFAULT_TILE_CHANNELS, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH, MAX_BATCH_SIZE,
    MAX_OVERLAP_FRACTION, MIN_BATCH_SIZE, MIN_OVERLAP_FRACTION, OVERLAP_PRESETS,
    SUPPORTED_SCALE_FACTORS, SUPPORTED_TILE_CHANNELS,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "render.toml";
const APP_NAME: &str = "tilestitch";

// ==========================================================================
// Value types
// ==========================================================================

/// Integer enlargement factor per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    pub x: u32,
    pub y: u32,
}

impl Scaling {
    #[must_use]
    pub const fn uniform(factor: u32) -> Self {
        Self {
            x: factor,
            y: factor,
        }
    }

    /// Scales `size` per axis.
    #[must_use]
    pub const fn apply(self, size: Size) -> Size {
        Size::new(size.width * self.x as usize, size.height * self.y as usize)
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self::uniform(DEFAULT_SCALE_FACTOR)
    }
}

/// Fraction of a tile shared with each neighbour, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub x: f64,
    pub y: f64,
}

impl Overlap {
    #[must_use]
    pub const fn uniform(fraction: f64) -> Self {
        Self {
            x: fraction,
            y: fraction,
        }
    }

    /// No overlap: tiles are placed edge to edge.
    pub const NONE: Self = Self::uniform(0.0);

    /// Returns `true` if both fractions are one of the tuned presets
    /// (0, 1/32, 1/16, 1/8).
    #[must_use]
    pub fn is_preset(&self) -> bool {
        OVERLAP_PRESETS.contains(&self.x) && OVERLAP_PRESETS.contains(&self.y)
    }
}

impl Default for Overlap {
    fn default() -> Self {
        Self::uniform(DEFAULT_OVERLAP_FRACTION)
    }
}

/// Executor tile shape, `channels x height x width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDims {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl TileDims {
    #[must_use]
    pub const fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    #[must_use]
    pub const fn size(self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for TileDims {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_CHANNELS, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH)
    }
}

/// Channel order of the planes handed to the executor.
///
/// Images enter and leave a render as RGB; `Bgr` only changes what the
/// executor sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

// ==========================================================================
// RenderConfig
// ==========================================================================

/// Settings for one render session. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub scaling: Scaling,
    pub overlap: Overlap,
    pub batch_size: usize,
    pub tile: TileDims,
    pub augmentation: bool,
    pub channel_order: ChannelOrder,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scaling: Scaling::default(),
            overlap: Overlap::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            tile: TileDims::default(),
            augmentation: DEFAULT_AUGMENTATION,
            channel_order: ChannelOrder::default(),
        }
    }
}

impl RenderConfig {
    /// Shape of the batches this configuration feeds the executor.
    #[must_use]
    pub const fn input_shape(&self) -> TensorShape {
        TensorShape::new(
            self.batch_size,
            self.tile.channels,
            self.tile.height,
            self.tile.width,
        )
    }

    /// Checks every field against the supported ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        for (axis, factor) in [("x", self.scaling.x), ("y", self.scaling.y)] {
            if !SUPPORTED_SCALE_FACTORS.contains(&factor) {
                return Err(Error::Configuration(format!(
                    "scale factor {factor} on {axis} is not one of {SUPPORTED_SCALE_FACTORS:?}"
                )));
            }
        }

        for (axis, fraction) in [("x", self.overlap.x), ("y", self.overlap.y)] {
            if !(MIN_OVERLAP_FRACTION..=MAX_OVERLAP_FRACTION).contains(&fraction) {
                return Err(Error::Configuration(format!(
                    "overlap {fraction} on {axis} is outside \
                     [{MIN_OVERLAP_FRACTION}, {MAX_OVERLAP_FRACTION}]"
                )));
            }
        }

        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(Error::Configuration(format!(
                "batch size {} is outside [{MIN_BATCH_SIZE}, {MAX_BATCH_SIZE}]",
                self.batch_size
            )));
        }

        if self.tile.channels != SUPPORTED_TILE_CHANNELS {
            return Err(Error::Configuration(format!(
                "{}-channel tiles are not supported, expected {SUPPORTED_TILE_CHANNELS}",
                self.tile.channels
            )));
        }
        if self.tile.size().is_empty() {
            return Err(Error::Configuration(format!(
                "tile size {} has a zero dimension",
                self.tile.size()
            )));
        }

        // 90 degree rotations would change the tile shape
        if self.augmentation && !self.tile.size().is_square() {
            return Err(Error::Configuration(format!(
                "augmentation needs square tiles, got {}",
                self.tile.size()
            )));
        }
        Ok(())
    }
}

// ==========================================================================
// Persistence
// ==========================================================================

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the user's config directory.
///
/// Returns defaults when no file exists yet.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load() -> Result<RenderConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(RenderConfig::default())
}

/// Saves the configuration to the user's config directory.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save(config: &RenderConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads a configuration from `path`. Missing fields take their defaults.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::ConfigParse`] if it is not valid TOML for a [`RenderConfig`].
pub fn load_from_path(path: &Path) -> Result<RenderConfig> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves a configuration to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem operation fails.
pub fn save_to_path(config: &RenderConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
