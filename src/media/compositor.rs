// SPDX-License-Identifier: MPL-2.0
//! Turns executor results into the final canvas.
//!
//! Results arrive in work-queue order. With augmentation each tile yields
//! eight consecutive results: they are un-augmented, summed and divided by
//! eight. Without augmentation the single result is used as is. A finished
//! tile is blended along its interior edges and added into the canvas.

use ndarray::{Array3, ArrayView3};

use super::blend::WeightMasks;
use super::tiling::TilePlan;
use super::work_queue::WorkItem;
use crate::domain::augmentation::AugmentationKind;
use crate::domain::geometry::Size;
use crate::domain::tile::Canvas;
use crate::error::{Error, Result};

/// Accumulates finished tiles for one render.
pub struct Compositor<'a> {
    masks: &'a WeightMasks,
    plan: &'a TilePlan,
    canvas: Canvas,
    steps_per_tile: usize,
    /// Running sum for the tile currently being averaged.
    sum: Array3<f32>,
    /// Scratch buffer for un-augmented results.
    restored: Array3<f32>,
    current_tile: Option<usize>,
    tiles_done: usize,
}

impl<'a> Compositor<'a> {
    /// Creates a compositor writing into a zeroed `canvas_size` canvas.
    ///
    /// With `augmentation` every tile needs one result per augmentation
    /// kind before it is finished.
    #[must_use]
    pub fn new(
        masks: &'a WeightMasks,
        plan: &'a TilePlan,
        channels: usize,
        canvas_size: Size,
        augmentation: bool,
    ) -> Self {
        let tile = masks.tile_size();
        let shape = (channels, tile.height, tile.width);
        Self {
            masks,
            plan,
            canvas: Canvas::zeros(channels, canvas_size),
            steps_per_tile: AugmentationKind::steps(augmentation),
            sum: Array3::zeros(shape),
            restored: Array3::zeros(shape),
            current_tile: None,
            tiles_done: 0,
        }
    }

    /// Number of tiles already added to the canvas.
    #[must_use]
    pub const fn tiles_done(&self) -> usize {
        self.tiles_done
    }

    /// Consumes the executor result for `item`.
    ///
    /// Padding items are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if the result has the wrong shape or
    /// an augmented result arrives for a tile other than the one being
    /// averaged.
    pub fn consume(&mut self, item: WorkItem, result: ArrayView3<'_, f32>) -> Result<()> {
        if item.is_padding(self.plan.len()) {
            return Ok(());
        }

        if self.steps_per_tile == 1 {
            self.check_shape(result)?;
            self.sum.assign(&result);
            return self.finish_tile(item.tile_index);
        }

        if item.augmentation == AugmentationKind::Identity {
            self.check_shape(result)?;
            self.sum.assign(&result);
            self.current_tile = Some(item.tile_index);
        } else {
            if self.current_tile != Some(item.tile_index) {
                return Err(Error::Precondition(format!(
                    "{} result for tile {} arrived while averaging {:?}",
                    item.augmentation, item.tile_index, self.current_tile
                )));
            }
            item.augmentation
                .inverse_into(result, self.restored.view_mut())?;
            self.sum += &self.restored;
        }

        if item.augmentation.index() + 1 == self.steps_per_tile {
            #[allow(clippy::cast_precision_loss)] // 8
            let divisor = self.steps_per_tile as f32;
            self.sum /= divisor;
            self.current_tile = None;
            return self.finish_tile(item.tile_index);
        }
        Ok(())
    }

    fn check_shape(&self, result: ArrayView3<'_, f32>) -> Result<()> {
        if result.shape() != self.sum.shape() {
            return Err(Error::mismatch(
                "executor result shape",
                format!("{:?}", self.sum.shape()),
                format!("{:?}", result.shape()),
            ));
        }
        Ok(())
    }

    fn finish_tile(&mut self, tile_index: usize) -> Result<()> {
        let geometry = self.plan.get(tile_index).ok_or_else(|| {
            Error::Precondition(format!(
                "tile index {tile_index} is outside the {}-tile plan",
                self.plan.len()
            ))
        })?;
        let rect = geometry.output;
        self.tiles_done += 1;
        if rect.is_empty() {
            return Ok(());
        }

        let canvas_size = self.canvas.size();
        self.masks.apply(self.sum.view_mut(), rect, canvas_size)?;
        self.canvas.accumulate(rect, self.sum.view())
    }

    /// Returns the canvas once every tile has been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if some tiles never completed.
    pub fn into_canvas(self) -> Result<Canvas> {
        if self.tiles_done != self.plan.len() {
            return Err(Error::Precondition(format!(
                "only {} of {} tiles were composited",
                self.tiles_done,
                self.plan.len()
            )));
        }
        Ok(self.canvas)
    }
}
