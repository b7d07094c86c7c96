// SPDX-License-Identifier: MPL-2.0
//! Tile grid planning.
//!
//! Splits an image into a grid of fixed-size input tiles and the matching
//! output rectangles on the enlarged canvas. Planning is pure geometry: no
//! pixel data is touched here.
//!
//! # Derived sizes
//!
//! An executor may return less than `input tile x scale` (models that trim a
//! border). The useful part of an input tile is then smaller than the tile
//! itself, so each input tile is centered around that useful region:
//!
//! - `scaled_output_tile`: input tile width times the scale factor, on both axes
//! - `scaled_input_tile`: the output tile mapped back into input space
//! - `input_overlap` / `output_overlap`: the overlap fraction in each space
//!
//! `scaled_output_tile` derives its height from the tile *width*. Square
//! tiles are unaffected; rectangular tiles get a vertical stride computed
//! from that width-based value.

use crate::config::{Overlap, Scaling};
use crate::domain::geometry::{Size, TileGeometry, TileRect};
use crate::error::{Error, Result};

// =============================================================================
// TilingParams
// =============================================================================

/// Tile sizes and overlaps derived once per render session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingParams {
    /// Fixed executor input tile.
    pub input_tile: Size,
    /// Fixed executor output tile.
    pub output_tile: Size,
    /// Input tile enlarged by the scale factor (width-based on both axes).
    pub scaled_output_tile: Size,
    /// Region of an input tile that maps onto the output tile.
    pub scaled_input_tile: Size,
    /// Overlap between neighbouring input tiles.
    pub input_overlap: Size,
    /// Overlap between neighbouring output tiles; also the blend ramp width.
    pub output_overlap: Size,
}

impl TilingParams {
    /// Derives tile geometry from the executor's tile sizes and the render
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a tile size is empty, the output
    /// tile is larger than the scaled input tile, a stride would be zero or
    /// negative, or the overlap exceeds half the output tile.
    pub fn derive(
        input_tile: Size,
        output_tile: Size,
        scaling: Scaling,
        overlap: Overlap,
    ) -> Result<Self> {
        if input_tile.is_empty() || output_tile.is_empty() {
            return Err(Error::Configuration(format!(
                "tile sizes must be non-empty, got input {input_tile} and output {output_tile}"
            )));
        }

        let scaled_output_tile = Size::new(
            input_tile.width * scaling.x as usize,
            input_tile.width * scaling.y as usize,
        );
        if scaled_output_tile.is_empty() {
            return Err(Error::Configuration(format!(
                "scale factor {}x{} collapses the tile",
                scaling.x, scaling.y
            )));
        }

        let scaled_input_tile = Size::new(
            ratio_round(output_tile.width, scaled_output_tile.width, input_tile.width),
            ratio_round(output_tile.height, scaled_output_tile.height, input_tile.height),
        );
        if scaled_input_tile.width > input_tile.width || scaled_input_tile.height > input_tile.height
        {
            return Err(Error::Configuration(format!(
                "output tile {output_tile} is larger than the {scaled_output_tile} \
                 the input tile can produce"
            )));
        }

        let input_overlap = Size::new(
            fraction_round(input_tile.width, overlap.x),
            fraction_round(input_tile.height, overlap.y),
        );
        let output_overlap = Size::new(
            fraction_round(scaled_output_tile.width, overlap.x),
            fraction_round(scaled_output_tile.height, overlap.y),
        );

        let params = Self {
            input_tile,
            output_tile,
            scaled_output_tile,
            scaled_input_tile,
            input_overlap,
            output_overlap,
        };
        params.check_strides()?;
        Ok(params)
    }

    fn check_strides(&self) -> Result<()> {
        let axes = [
            (
                "horizontal",
                self.scaled_input_tile.width,
                self.input_overlap.width,
                self.output_tile.width,
                self.output_overlap.width,
            ),
            (
                "vertical",
                self.scaled_input_tile.height,
                self.input_overlap.height,
                self.output_tile.height,
                self.output_overlap.height,
            ),
        ];
        for (axis, scaled_input, input_overlap, output, output_overlap) in axes {
            if scaled_input <= input_overlap {
                return Err(Error::Configuration(format!(
                    "{axis} input stride is not positive: tile {scaled_input}, overlap {input_overlap}"
                )));
            }
            if output <= output_overlap {
                return Err(Error::Configuration(format!(
                    "{axis} output stride is not positive: tile {output}, overlap {output_overlap}"
                )));
            }
            // a pixel may be shared by two tiles per axis, never three
            if 2 * output_overlap > output {
                return Err(Error::Configuration(format!(
                    "{axis} overlap {output_overlap} exceeds half the {output} px output tile"
                )));
            }
        }
        Ok(())
    }

    /// Distance between the origins of neighbouring input tiles.
    #[must_use]
    pub const fn input_stride(&self) -> Size {
        Size::new(
            self.scaled_input_tile.width - self.input_overlap.width,
            self.scaled_input_tile.height - self.input_overlap.height,
        )
    }

    /// Distance between the origins of neighbouring output rectangles.
    #[must_use]
    pub const fn output_stride(&self) -> Size {
        Size::new(
            self.output_tile.width - self.output_overlap.width,
            self.output_tile.height - self.output_overlap.height,
        )
    }

    /// Returns `true` if the input stride times the scale factor equals the
    /// output stride on both axes.
    ///
    /// The two overlaps are rounded separately, so small tiles or odd overlap
    /// fractions can break this. Input tiles then drift against their output
    /// rectangles by one pixel per tile.
    #[must_use]
    pub fn strides_agree(&self, scaling: Scaling) -> bool {
        let input = self.input_stride();
        let output = self.output_stride();
        input.width * scaling.x as usize == output.width
            && input.height * scaling.y as usize == output.height
    }

    /// Number of tile columns and rows for an image.
    ///
    /// Counted in output space as `ceil((extent - overlap) / stride)` per
    /// axis. With consistent strides this equals [`input_grid`](Self::input_grid);
    /// when rounding makes them disagree the output count is used.
    #[must_use]
    pub fn grid(&self, output: Size) -> Size {
        let stride = self.output_stride();
        Size::new(
            axis_count(output.width, self.output_overlap.width, stride.width),
            axis_count(output.height, self.output_overlap.height, stride.height),
        )
    }

    /// Tile count an `input` image needs in input space.
    #[must_use]
    pub fn input_grid(&self, input: Size) -> Size {
        let stride = self.input_stride();
        Size::new(
            axis_count(input.width, self.input_overlap.width, stride.width),
            axis_count(input.height, self.input_overlap.height, stride.height),
        )
    }

    /// Plans every tile needed to cover an `output` canvas.
    ///
    /// Tiles are numbered column by column: index `k` is column `k / rows`,
    /// row `k % rows`. Output rectangles in the last column and row are
    /// clipped to the canvas; input rectangles always keep the full tile size.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // tile and image sizes are far below i64::MAX
    pub fn plan(&self, output: Size) -> TilePlan {
        let grid = self.grid(output);
        let input_stride = self.input_stride();
        let output_stride = self.output_stride();

        let border_x = ((self.input_tile.width - self.scaled_input_tile.width) / 2) as i64;
        let border_y = ((self.input_tile.height - self.scaled_input_tile.height) / 2) as i64;

        let mut tiles = Vec::with_capacity(grid.area());
        for column in 0..grid.width {
            for row in 0..grid.height {
                let input_rect = TileRect::new(
                    -border_x + (column * input_stride.width) as i64,
                    -border_y + (row * input_stride.height) as i64,
                    self.input_tile.width,
                    self.input_tile.height,
                );

                let x = column * output_stride.width;
                let y = row * output_stride.height;
                let output_rect = TileRect::new(
                    x as i64,
                    y as i64,
                    clip_extent(x, self.output_tile.width, output.width),
                    clip_extent(y, self.output_tile.height, output.height),
                );

                tiles.push(TileGeometry {
                    input: input_rect,
                    output: output_rect,
                });
            }
        }

        TilePlan { grid, tiles }
    }
}

// =============================================================================
// TilePlan
// =============================================================================

/// Geometry of every tile for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlan {
    /// Columns (`width`) and rows (`height`) of the grid.
    pub grid: Size,
    /// Tiles in column-major order.
    pub tiles: Vec<TileGeometry>,
}

impl TilePlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TileGeometry> {
        self.tiles.get(index)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `round(numerator / denominator * value)`, rounding half away from zero.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn ratio_round(numerator: usize, denominator: usize, value: usize) -> usize {
    (numerator as f64 / denominator as f64 * value as f64).round() as usize
}

/// `round(extent * fraction)`, with negative fractions treated as zero.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn fraction_round(extent: usize, fraction: f64) -> usize {
    (extent as f64 * fraction.max(0.0)).round() as usize
}

/// `ceil((extent - overlap) / stride)`, at least one.
fn axis_count(extent: usize, overlap: usize, stride: usize) -> usize {
    extent.saturating_sub(overlap).div_ceil(stride).max(1)
}

/// Length of a tile starting at `origin`, clipped to `limit`.
fn clip_extent(origin: usize, tile: usize, limit: usize) -> usize {
    if origin + tile > limit {
        limit.saturating_sub(origin)
    } else {
        tile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(tile: usize, out: usize, scale: u32, overlap: f64) -> TilingParams {
        TilingParams::derive(
            Size::new(tile, tile),
            Size::new(out, out),
            Scaling::uniform(scale),
            Overlap::uniform(overlap),
        )
        .expect("valid tiling")
    }

    fn union_covers(plan: &TilePlan, canvas: Size) -> bool {
        let mut covered = vec![false; canvas.area()];
        for tile in &plan.tiles {
            let rect = tile.output;
            for y in rect.y..rect.bottom() {
                for x in rect.x..rect.right() {
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    let index = y as usize * canvas.width + x as usize;
                    covered[index] = true;
                }
            }
        }
        covered.into_iter().all(|c| c)
    }

    #[test]
    fn default_strides_agree() {
        let params = params(256, 512, 2, 1.0 / 16.0);
        assert_eq!(params.input_stride(), Size::new(240, 240));
        assert_eq!(params.output_stride(), Size::new(480, 480));
        assert!(params.strides_agree(Scaling::uniform(2)));
    }

    #[test]
    fn separately_rounded_overlaps_are_detected() {
        // 16 * 1/32 rounds to 1 input px while 32 * 1/32 is 1 output px
        let small = params(16, 32, 2, 1.0 / 32.0);
        assert_eq!(small.input_stride(), Size::new(15, 15));
        assert_eq!(small.output_stride(), Size::new(31, 31));
        assert!(!small.strides_agree(Scaling::uniform(2)));

        assert!(!params(48, 96, 2, 1.0 / 32.0).strides_agree(Scaling::uniform(2)));
        assert!(params(64, 128, 2, 1.0 / 32.0).strides_agree(Scaling::uniform(2)));
    }

    #[test]
    fn derive_matches_plain_two_times_model() {
        let params = params(256, 512, 2, 1.0 / 16.0);
        assert_eq!(params.scaled_output_tile, Size::new(512, 512));
        assert_eq!(params.scaled_input_tile, Size::new(256, 256));
        assert_eq!(params.input_overlap, Size::new(16, 16));
        assert_eq!(params.output_overlap, Size::new(32, 32));
        assert_eq!(params.input_stride(), Size::new(240, 240));
        assert_eq!(params.output_stride(), Size::new(480, 480));
    }

    #[test]
    fn border_cropping_model_centers_input_tiles() {
        // 64 px in, 2x, but the model trims 4 output px from each side
        let params = params(64, 120, 2, 1.0 / 16.0);
        assert_eq!(params.scaled_input_tile, Size::new(60, 60));
        assert_eq!(params.input_overlap, Size::new(4, 4));
        assert_eq!(params.output_overlap, Size::new(8, 8));

        let plan = params.plan(Size::new(200, 200));
        assert_eq!(plan.tiles[0].input, TileRect::new(-2, -2, 64, 64));
        assert_eq!(plan.tiles[0].output, TileRect::new(0, 0, 120, 120));
        // input stride 56 maps onto output stride 112
        assert_eq!(plan.tiles[1].input.y, 54);
        assert_eq!(plan.tiles[1].output.y, 112);
    }

    #[test]
    fn six_forty_square_needs_three_by_three() {
        let params = params(256, 512, 2, 1.0 / 16.0);
        let plan = params.plan(Size::new(1280, 1280));

        assert_eq!(plan.grid, Size::new(3, 3));
        assert_eq!(plan.len(), 9);
        let xs: Vec<i64> = plan.tiles.iter().step_by(3).map(|t| t.output.x).collect();
        assert_eq!(xs, vec![0, 480, 960]);
        assert_eq!(plan.tiles[8].output, TileRect::new(960, 960, 320, 320));
        assert!(union_covers(&plan, Size::new(1280, 1280)));
    }

    #[test]
    fn four_eighty_square_needs_two_by_two() {
        let params = params(256, 512, 2, 1.0 / 16.0);
        let plan = params.plan(Size::new(960, 960));

        assert_eq!(plan.grid, Size::new(2, 2));
        assert_eq!(plan.tiles[0].output, TileRect::new(0, 0, 512, 512));
        assert_eq!(plan.tiles[3].output, TileRect::new(480, 480, 480, 480));
        assert_eq!(plan.tiles[3].input, TileRect::new(240, 240, 256, 256));
        assert!(union_covers(&plan, Size::new(960, 960)));
    }

    #[test]
    fn tiles_are_column_major() {
        let params = params(256, 512, 2, 1.0 / 16.0);
        let plan = params.plan(Size::new(960, 960));
        // second tile is below the first, third is to its right
        assert_eq!((plan.tiles[1].output.x, plan.tiles[1].output.y), (0, 480));
        assert_eq!((plan.tiles[2].output.x, plan.tiles[2].output.y), (480, 0));
    }

    #[test]
    fn coverage_holds_across_sizes_and_overlaps() {
        for overlap in [0.0, 1.0 / 32.0, 1.0 / 16.0, 1.0 / 8.0] {
            for scale in [1, 2, 4] {
                let params = params(32, 32 * scale as usize, scale, overlap);
                for (w, h) in [(1, 1), (31, 47), (32, 32), (33, 90), (100, 7)] {
                    let input = Size::new(w, h);
                    let output = Scaling::uniform(scale).apply(input);
                    let plan = params.plan(output);
                    assert_eq!(params.input_grid(input), plan.grid);
                    assert!(
                        union_covers(&plan, output),
                        "gap for {input} at scale {scale}, overlap {overlap}"
                    );
                    for tile in &plan.tiles {
                        assert_eq!(tile.input.size(), Size::new(32, 32));
                        assert!(TileRect::from_size(output).contains(&tile.output));
                    }
                }
            }
        }
    }

    #[test]
    fn image_smaller_than_one_tile_gets_one_tile() {
        let params = params(256, 512, 2, 1.0 / 16.0);
        let plan = params.plan(Size::new(20, 40));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.tiles[0].output, TileRect::new(0, 0, 20, 40));
    }

    #[test]
    fn rectangular_tiles_use_width_for_vertical_scale() {
        let params = TilingParams::derive(
            Size::new(64, 32),
            Size::new(128, 64),
            Scaling::uniform(2),
            Overlap::NONE,
        )
        .expect("valid tiling");
        // height derived from the 64 px width, not the 32 px height
        assert_eq!(params.scaled_output_tile, Size::new(128, 128));
        assert_eq!(params.scaled_input_tile, Size::new(64, 16));
        assert_eq!(params.input_stride(), Size::new(64, 16));
        assert_eq!(params.output_stride(), Size::new(128, 64));
    }

    #[test]
    fn non_positive_stride_is_rejected() {
        let result = TilingParams::derive(
            Size::new(16, 16),
            Size::new(2, 2),
            Scaling::uniform(1),
            Overlap::uniform(0.125),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn oversized_output_tile_is_rejected() {
        let result = TilingParams::derive(
            Size::new(64, 64),
            Size::new(256, 256),
            Scaling::uniform(2),
            Overlap::NONE,
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn zero_overlap_places_tiles_edge_to_edge() {
        let params = params(64, 128, 2, 0.0);
        let plan = params.plan(Size::new(256, 128));
        assert_eq!(plan.grid, Size::new(2, 1));
        assert_eq!(plan.tiles[1].output, TileRect::new(128, 0, 128, 128));
        assert_eq!(plan.tiles[1].input, TileRect::new(64, 0, 64, 64));
    }
}
