// SPDX-License-Identifier: MPL-2.0
//! Seam blending weights.
//!
//! Each output tile is attenuated along its interior edges before it is
//! added to the canvas. Neighbouring tiles ramp in opposite directions over
//! the shared band, so their weights add up to exactly one at every pixel.
//!
//! Row `i` (1-based) of the top ramp has weight `i / (overlap + 1)`; the
//! bottom ramp is its vertical mirror. The left and right ramps follow the
//! same rule on columns.

use ndarray::{s, Array2, ArrayViewMut3, Axis};

use crate::domain::geometry::{Size, TileRect};
use crate::error::{Error, Result};

/// Edge of a tile a mask attenuates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// The four directional masks for one output tile size.
///
/// Generated once per session and shared by every tile of every render.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMasks {
    pub top: Array2<f32>,
    pub right: Array2<f32>,
    pub bottom: Array2<f32>,
    pub left: Array2<f32>,
    overlap: Size,
}

impl WeightMasks {
    /// Builds masks of `tile` size ramping over `overlap` pixels per axis.
    ///
    /// Overlap larger than the tile is capped at the tile size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // ramp lengths are tile-sized
    pub fn generate(overlap: Size, tile: Size) -> Self {
        let overlap = Size::new(overlap.width.min(tile.width), overlap.height.min(tile.height));
        let shape = (tile.height, tile.width);

        let mut top = Array2::<f32>::ones(shape);
        let denominator = (overlap.height + 1) as f32;
        for (i, mut row) in top.outer_iter_mut().take(overlap.height).enumerate() {
            row.fill((i + 1) as f32 / denominator);
        }

        let mut left = Array2::<f32>::ones(shape);
        let denominator = (overlap.width + 1) as f32;
        for (i, mut column) in left.axis_iter_mut(Axis(1)).take(overlap.width).enumerate() {
            column.fill((i + 1) as f32 / denominator);
        }

        let bottom = top.slice(s![..;-1, ..]).to_owned();
        let right = left.slice(s![.., ..;-1]).to_owned();

        Self {
            top,
            right,
            bottom,
            left,
            overlap,
        }
    }

    /// Ramp width per axis.
    #[must_use]
    pub const fn overlap(&self) -> Size {
        self.overlap
    }

    /// Tile size the masks were built for.
    #[must_use]
    pub fn tile_size(&self) -> Size {
        let (height, width) = self.top.dim();
        Size::new(width, height)
    }

    /// Returns `true` when every mask is all ones (no overlap).
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.overlap.width == 0 && self.overlap.height == 0
    }

    #[must_use]
    pub fn mask(&self, edge: Edge) -> &Array2<f32> {
        match edge {
            Edge::Top => &self.top,
            Edge::Right => &self.right,
            Edge::Bottom => &self.bottom,
            Edge::Left => &self.left,
        }
    }

    /// Edges of a tile placed at `rect` that border another tile rather
    /// than the canvas boundary.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // canvas sizes are far below i64::MAX
    pub fn interior_edges(rect: TileRect, canvas: Size) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(4);
        if rect.x > 0 {
            edges.push(Edge::Left);
        }
        if rect.y > 0 {
            edges.push(Edge::Top);
        }
        if rect.right() < canvas.width as i64 {
            edges.push(Edge::Right);
        }
        if rect.bottom() < canvas.height as i64 {
            edges.push(Edge::Bottom);
        }
        edges
    }

    /// Attenuates every interior edge of a `C x H x W` output tile in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if the tile's spatial size differs
    /// from the masks.
    pub fn apply(
        &self,
        mut tile: ArrayViewMut3<'_, f32>,
        rect: TileRect,
        canvas: Size,
    ) -> Result<()> {
        let (_, height, width) = tile.dim();
        if Size::new(width, height) != self.tile_size() {
            return Err(Error::mismatch(
                "output tile size",
                self.tile_size(),
                Size::new(width, height),
            ));
        }
        if self.is_identity() {
            return Ok(());
        }

        for edge in Self::interior_edges(rect, canvas) {
            let mask = self.mask(edge);
            for mut plane in tile.outer_iter_mut() {
                plane *= mask;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;
    use ndarray::Array3;

    #[test]
    fn top_ramp_follows_one_based_rows() {
        let masks = WeightMasks::generate(Size::new(3, 3), Size::new(8, 8));
        assert_abs_diff_eq!(masks.top[[0, 5]], 0.25);
        assert_abs_diff_eq!(masks.top[[1, 5]], 0.5);
        assert_abs_diff_eq!(masks.top[[2, 5]], 0.75);
        assert_abs_diff_eq!(masks.top[[3, 5]], 1.0);
        assert_abs_diff_eq!(masks.top[[7, 0]], 1.0);
    }

    #[test]
    fn mirrored_masks() {
        let masks = WeightMasks::generate(Size::new(2, 4), Size::new(6, 10));
        assert_abs_diff_eq!(masks.bottom[[9, 0]], masks.top[[0, 0]]);
        assert_abs_diff_eq!(masks.bottom[[6, 3]], masks.top[[3, 3]]);
        assert_abs_diff_eq!(masks.right[[0, 5]], masks.left[[0, 0]]);
        assert_abs_diff_eq!(masks.right[[4, 4]], masks.left[[4, 1]]);
        assert_abs_diff_eq!(masks.left[[0, 2]], 1.0);
    }

    #[test]
    fn values_are_monotonic_and_bounded() {
        let masks = WeightMasks::generate(Size::new(16, 16), Size::new(64, 64));
        let column: Vec<f32> = masks.top.column(10).to_vec();
        assert!(column.windows(2).all(|w| w[0] <= w[1]));
        assert!(masks
            .left
            .iter()
            .chain(masks.right.iter())
            .all(|&v| v > 0.0 && v <= 1.0));
    }

    #[test]
    fn horizontal_neighbours_sum_to_one() {
        for overlap in [4, 8, 16, 32] {
            let tile = 128;
            let masks = WeightMasks::generate(Size::new(overlap, overlap), Size::new(tile, tile));
            for k in 0..overlap {
                let left_tile = masks.right[[0, tile - overlap + k]];
                let right_tile = masks.left[[0, k]];
                assert_abs_diff_eq!(left_tile + right_tile, 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn vertical_neighbours_sum_to_one() {
        let (overlap, tile) = (16, 256);
        let masks = WeightMasks::generate(Size::new(overlap, overlap), Size::new(tile, tile));
        for k in 0..overlap {
            let upper = masks.bottom[[tile - overlap + k, 7]];
            let lower = masks.top[[k, 7]];
            assert_abs_diff_eq!(upper + lower, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_overlap_masks_are_identity() {
        let masks = WeightMasks::generate(Size::new(0, 0), Size::new(16, 16));
        assert!(masks.is_identity());
        for edge in [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left] {
            assert!(masks.mask(edge).iter().all(|&v| v == 1.0));
        }
    }

    #[test]
    fn interior_edges_skip_canvas_border() {
        let canvas = Size::new(100, 100);
        assert_eq!(
            WeightMasks::interior_edges(TileRect::new(0, 0, 60, 60), canvas),
            vec![Edge::Right, Edge::Bottom]
        );
        assert_eq!(
            WeightMasks::interior_edges(TileRect::new(50, 50, 50, 50), canvas),
            vec![Edge::Left, Edge::Top]
        );
        assert!(WeightMasks::interior_edges(TileRect::new(0, 0, 100, 100), canvas).is_empty());
    }

    #[test]
    fn apply_attenuates_only_interior_edges() {
        let masks = WeightMasks::generate(Size::new(1, 1), Size::new(4, 4));
        let mut tile = Array3::<f32>::ones((3, 4, 4));
        // top-left tile of a larger canvas: right and bottom are interior
        masks
            .apply(tile.view_mut(), TileRect::new(0, 0, 4, 4), Size::new(8, 8))
            .expect("apply");

        assert_abs_diff_eq!(tile[[0, 0, 0]], 1.0);
        assert_abs_diff_eq!(tile[[1, 0, 3]], 0.5);
        assert_abs_diff_eq!(tile[[2, 3, 0]], 0.5);
        assert_abs_diff_eq!(tile[[2, 3, 3]], 0.25);
    }

    #[test]
    fn apply_rejects_wrong_tile_size() {
        let masks = WeightMasks::generate(Size::new(1, 1), Size::new(4, 4));
        let mut tile = Array3::<f32>::ones((3, 4, 5));
        let result = masks.apply(tile.view_mut(), TileRect::new(0, 0, 4, 4), Size::new(8, 8));
        assert!(matches!(result, Err(Error::Precondition(_))));
    }
}
