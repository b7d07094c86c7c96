// SPDX-License-Identifier: MPL-2.0
//! Owned pixel buffers used during a render.
//!
//! All buffers hold normalized `f32` samples in planar order. A tile is
//! `C x H x W`, a batch is `N x C x H x W`. Buffers are plain owned values;
//! they are released when the render that created them returns, whether it
//! succeeded or not.

use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4, ArrayViewMut3, Axis};

use super::geometry::{Size, TileRect};
use crate::error::{Error, Result};

// =============================================================================
// TensorShape
// =============================================================================

/// Shape of an `N x C x H x W` tile batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorShape {
    pub batch: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl TensorShape {
    #[must_use]
    pub const fn new(batch: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            batch,
            channels,
            height,
            width,
        }
    }

    /// Spatial size of one tile.
    #[must_use]
    pub const fn tile_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Shape of one tile as `(C, H, W)`.
    #[must_use]
    pub const fn tile_dims(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    #[must_use]
    pub const fn dims(&self) -> [usize; 4] {
        [self.batch, self.channels, self.height, self.width]
    }

    /// Number of `f32` elements in a full batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.batch * self.channels * self.height * self.width
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a shape from a 4-D dimension slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if `dims` does not have four entries.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match *dims {
            [batch, channels, height, width] => Ok(Self::new(batch, channels, height, width)),
            _ => Err(Error::mismatch("tensor rank", 4, dims.len())),
        }
    }

    /// Checks that `actual` matches this shape, dimension by dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] naming the first dimension that differs.
    pub fn check(&self, actual: &[usize]) -> Result<()> {
        let actual = Self::from_dims(actual)?;
        if actual.batch != self.batch {
            return Err(Error::mismatch("batch size", self.batch, actual.batch));
        }
        if actual.channels != self.channels {
            return Err(Error::mismatch(
                "number of channels",
                self.channels,
                actual.channels,
            ));
        }
        if actual.height != self.height {
            return Err(Error::mismatch("height", self.height, actual.height));
        }
        if actual.width != self.width {
            return Err(Error::mismatch("width", self.width, actual.width));
        }
        Ok(())
    }
}

impl std::fmt::Display for TensorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}x{}x{}",
            self.batch, self.channels, self.height, self.width
        )
    }
}

// =============================================================================
// TileBatch
// =============================================================================

/// Reusable input buffer holding one batch of tiles.
#[derive(Debug, Clone)]
pub struct TileBatch {
    data: Array4<f32>,
}

impl TileBatch {
    /// Allocates a zero-filled batch.
    #[must_use]
    pub fn zeros(shape: TensorShape) -> Self {
        Self {
            data: Array4::zeros(shape.dims()),
        }
    }

    #[must_use]
    pub fn shape(&self) -> TensorShape {
        let (batch, channels, height, width) = self.data.dim();
        TensorShape::new(batch, channels, height, width)
    }

    /// Mutable view of one slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below the batch size.
    pub fn slot_mut(&mut self, slot: usize) -> ArrayViewMut3<'_, f32> {
        self.data.index_axis_mut(Axis(0), slot)
    }

    /// Fills one slot with zeros.
    pub fn clear_slot(&mut self, slot: usize) {
        self.slot_mut(slot).fill(0.0);
    }

    #[must_use]
    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }
}

// =============================================================================
// Canvas
// =============================================================================

/// Full-resolution accumulation buffer for one render.
///
/// Starts zeroed; tiles are added into it, never written over.
#[derive(Debug, Clone)]
pub struct Canvas {
    data: Array3<f32>,
}

impl Canvas {
    #[must_use]
    pub fn zeros(channels: usize, size: Size) -> Self {
        Self {
            data: Array3::zeros((channels, size.height, size.width)),
        }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        let (_, height, width) = self.data.dim();
        Size::new(width, height)
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().0
    }

    #[must_use]
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    #[must_use]
    pub fn into_inner(self) -> Array3<f32> {
        self.data
    }

    /// Adds the top-left `rect.width x rect.height` region of `tile` into
    /// the canvas at `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if `rect` is not inside the canvas,
    /// `tile` is smaller than `rect`, or the channel counts differ.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)] // origin checked >= 0
    pub fn accumulate(&mut self, rect: TileRect, tile: ArrayView3<'_, f32>) -> Result<()> {
        let bounds = TileRect::from_size(self.size());
        if !bounds.contains(&rect) {
            return Err(Error::Precondition(format!(
                "tile rect {rect:?} lies outside the {} canvas",
                self.size()
            )));
        }
        let (channels, height, width) = tile.dim();
        if channels != self.channels() {
            return Err(Error::mismatch(
                "number of channels",
                self.channels(),
                channels,
            ));
        }
        if height < rect.height || width < rect.width {
            return Err(Error::Precondition(format!(
                "tile {width}x{height} is smaller than its {}x{} output rect",
                rect.width, rect.height
            )));
        }

        let (x, y) = (rect.x as usize, rect.y as usize);
        let mut region = self
            .data
            .slice_mut(s![.., y..y + rect.height, x..x + rect.width]);
        region += &tile.slice(s![.., ..rect.height, ..rect.width]);
        Ok(())
    }
}
