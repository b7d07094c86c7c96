// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! and bounds used by [`RenderConfig`](super::RenderConfig).
//!
//! # Categories
//!
//! - **Scaling**: Supported integer enlargement factors
//! - **Overlap**: Fraction of a tile shared with its neighbours
//! - **Batching**: Number of tiles per executor call
//! - **Tile**: Executor tile shape assumed before a model is loaded

// ==========================================================================
// Scaling Defaults
// ==========================================================================

/// Default enlargement factor on both axes.
pub const DEFAULT_SCALE_FACTOR: u32 = 2;

/// Scale factors an executor may be configured for.
pub const SUPPORTED_SCALE_FACTORS: [u32; 3] = [1, 2, 4];

// ==========================================================================
// Overlap Defaults
// ==========================================================================

/// Default overlap fraction on both axes.
pub const DEFAULT_OVERLAP_FRACTION: f64 = 1.0 / 16.0;

/// Smallest accepted overlap fraction (no blending).
pub const MIN_OVERLAP_FRACTION: f64 = 0.0;

/// Largest accepted overlap fraction.
pub const MAX_OVERLAP_FRACTION: f64 = 0.125;

/// Overlap fractions offered to users.
pub const OVERLAP_PRESETS: [f64; 4] = [0.0, 1.0 / 32.0, 1.0 / 16.0, 1.0 / 8.0];

// ==========================================================================
// Batching Defaults
// ==========================================================================

/// Default number of tiles per executor call.
pub const DEFAULT_BATCH_SIZE: usize = 4;

/// Minimum batch size.
pub const MIN_BATCH_SIZE: usize = 1;

/// Maximum batch size.
pub const MAX_BATCH_SIZE: usize = 256;

// ==========================================================================
// Tile Defaults
// ==========================================================================

/// Default channel count (RGB).
pub const DEFAULT_TILE_CHANNELS: usize = 3;

/// Default tile height in pixels.
pub const DEFAULT_TILE_HEIGHT: usize = 256;

/// Default tile width in pixels.
pub const DEFAULT_TILE_WIDTH: usize = 256;

/// Channel count the 8-bit image conversion supports.
pub const SUPPORTED_TILE_CHANNELS: usize = 3;

/// Default: test-time augmentation off.
pub const DEFAULT_AUGMENTATION: bool = false;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(DEFAULT_SCALE_FACTOR == SUPPORTED_SCALE_FACTORS[1]);

    assert!(MIN_OVERLAP_FRACTION < MAX_OVERLAP_FRACTION);
    assert!(DEFAULT_OVERLAP_FRACTION >= MIN_OVERLAP_FRACTION);
    assert!(DEFAULT_OVERLAP_FRACTION <= MAX_OVERLAP_FRACTION);
    assert!(OVERLAP_PRESETS[3] <= MAX_OVERLAP_FRACTION);

    assert!(MIN_BATCH_SIZE > 0);
    assert!(DEFAULT_BATCH_SIZE >= MIN_BATCH_SIZE);
    assert!(DEFAULT_BATCH_SIZE <= MAX_BATCH_SIZE);

    assert!(DEFAULT_TILE_CHANNELS == SUPPORTED_TILE_CHANNELS);
    assert!(DEFAULT_TILE_HEIGHT > 0);
    assert!(DEFAULT_TILE_WIDTH > 0);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_defaults_are_valid() {
        assert_eq!(DEFAULT_SCALE_FACTOR, 2);
        assert!(SUPPORTED_SCALE_FACTORS.contains(&DEFAULT_SCALE_FACTOR));
    }

    #[test]
    fn overlap_presets_are_in_range() {
        for preset in OVERLAP_PRESETS {
            assert!((MIN_OVERLAP_FRACTION..=MAX_OVERLAP_FRACTION).contains(&preset));
        }
        assert!(OVERLAP_PRESETS.contains(&DEFAULT_OVERLAP_FRACTION));
    }

    #[test]
    fn batch_defaults_are_valid() {
        assert_eq!(DEFAULT_BATCH_SIZE, 4);
        assert!(DEFAULT_BATCH_SIZE >= MIN_BATCH_SIZE);
        assert!(DEFAULT_BATCH_SIZE <= MAX_BATCH_SIZE);
    }

    #[test]
    fn tile_defaults_are_square() {
        assert_eq!(DEFAULT_TILE_WIDTH, DEFAULT_TILE_HEIGHT);
    }
}
