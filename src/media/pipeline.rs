// SPDX-License-Identifier: MPL-2.0
//! Render sessions: the batch pipeline that drives a tile executor.
//!
//! A [`RenderSession`] binds one executor to one [`RenderConfig`]. Creating
//! it validates the executor's tile shapes and precomputes the blend masks;
//! each [`render`](RenderSession::render) call then runs three phases:
//!
//! 1. **Planning**: size the output canvas and lay out the tile grid
//! 2. **Streaming**: fill fixed-size batches with padded, augmented tiles,
//!    run the executor on each full batch and composite the results
//! 3. **Finalizing**: wait for the executor and convert the canvas to 8-bit
//!
//! Any failure aborts the call; the partially filled canvas is dropped.

use std::time::Instant;

use image_rs::{DynamicImage, Rgba, Rgba32FImage, RgbImage};
use ndarray::{Array3, ArrayView3};

use super::blend::WeightMasks;
use super::compositor::Compositor;
use super::conversion::{
    convert_to, float_image_to_planes, image_to_planes, planes_to_float_image, planes_to_image,
};
use super::padding;
use super::tiling::{TilePlan, TilingParams};
use super::work_queue::{Schedule, WorkQueue};
use crate::application::port::{infer_checked, TileExecutor};
use crate::config::RenderConfig;
use crate::domain::augmentation::AugmentationKind;
use crate::domain::geometry::Size;
use crate::domain::tile::{Canvas, TensorShape, TileBatch};
use crate::error::{Error, Result};

// =============================================================================
// RenderSession
// =============================================================================

/// An executor paired with a validated configuration.
///
/// # Example
///
/// ```
/// use tilestitch::config::{RenderConfig, TileDims};
/// use tilestitch::infrastructure::reference::NearestExecutor;
/// use tilestitch::media::pipeline::RenderSession;
/// use image_rs::RgbImage;
///
/// let config = RenderConfig {
///     tile: TileDims::new(3, 32, 32),
///     ..RenderConfig::default()
/// };
/// let executor = NearestExecutor::new(config.input_shape(), 2);
/// let mut session = RenderSession::new(executor, config).unwrap();
///
/// let output = session.render(&RgbImage::new(40, 24)).unwrap();
/// assert_eq!(output.dimensions(), (80, 48));
/// ```
pub struct RenderSession<E: TileExecutor> {
    executor: E,
    config: RenderConfig,
    params: TilingParams,
    masks: WeightMasks,
}

impl<E: TileExecutor> RenderSession<E> {
    /// Creates a session, validating `config` against the executor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid, the
    /// executor's tile shapes disagree with it, or the derived tiling has a
    /// non-positive stride.
    pub fn new(executor: E, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let input_shape = executor.input_shape();
        let output_shape = executor.output_shape();
        check_executor_shapes(&config, input_shape, output_shape)?;

        let params = TilingParams::derive(
            input_shape.tile_size(),
            output_shape.tile_size(),
            config.scaling,
            config.overlap,
        )?;
        let masks = WeightMasks::generate(params.output_overlap, params.output_tile);
        if !config.overlap.is_preset() {
            tracing::debug!(
                x = config.overlap.x,
                y = config.overlap.y,
                "overlap is not one of the presets"
            );
        }
        if !params.strides_agree(config.scaling) {
            tracing::warn!(
                input_stride = %params.input_stride(),
                output_stride = %params.output_stride(),
                "overlap rounding leaves input and output strides out of step; seams may shift"
            );
        }

        tracing::info!(
            executor = executor.name(),
            input_tile = %params.input_tile,
            output_tile = %params.output_tile,
            input_overlap = %params.input_overlap,
            output_overlap = %params.output_overlap,
            batch_size = config.batch_size,
            augmentation = config.augmentation,
            "render session ready"
        );

        Ok(Self {
            executor,
            config,
            params,
            masks,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[must_use]
    pub fn params(&self) -> &TilingParams {
        &self.params
    }

    #[must_use]
    pub fn masks(&self) -> &WeightMasks {
        &self.masks
    }

    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Ends the session and hands the executor back.
    #[must_use]
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Output size for an input of `size`.
    #[must_use]
    pub fn output_size(&self, size: Size) -> Size {
        self.config.scaling.apply(size)
    }

    /// Tile layout for an input of `size`.
    #[must_use]
    pub fn plan(&self, size: Size) -> TilePlan {
        self.params.plan(self.output_size(size))
    }

    /// Renders an RGB image. The result is `scale` times larger per axis.
    ///
    /// # Errors
    ///
    /// - [`Error::Capture`] if the image is empty
    /// - [`Error::Precondition`] or [`Error::Backend`] if any batch fails
    #[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn render(&mut self, image: &RgbImage) -> Result<RgbImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Capture(format!(
                "image is {}x{}",
                image.width(),
                image.height()
            )));
        }
        let order = self.config.channel_order;
        let source = image_to_planes(image, order);
        let canvas = self.render_planes(source.view())?;
        planes_to_image(canvas.view(), order)
    }

    /// Renders any image and returns it in the same pixel encoding.
    ///
    /// Encodings other than 8-bit RGB are rendered from 32-bit float RGB, so
    /// 16-bit and float depth survive. An alpha channel is not passed to the
    /// executor; it is enlarged by nearest neighbour instead.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    #[tracing::instrument(
        skip_all,
        fields(width = image.width(), height = image.height(), color = ?image.color())
    )]
    pub fn render_dynamic(&mut self, image: &DynamicImage) -> Result<DynamicImage> {
        if let DynamicImage::ImageRgb8(rgb) = image {
            return self.render(rgb).map(DynamicImage::ImageRgb8);
        }

        let order = self.config.channel_order;
        let source = float_image_to_planes(&image.to_rgb32f(), order);
        let canvas = self.render_planes(source.view())?;
        let rgb = planes_to_float_image(canvas.view(), order)?;

        let color = image.color();
        let rendered = if color.has_alpha() {
            let alpha = image.to_rgba32f();
            let (sx, sy) = (self.config.scaling.x, self.config.scaling.y);
            DynamicImage::ImageRgba32F(Rgba32FImage::from_fn(
                rgb.width(),
                rgb.height(),
                |x, y| {
                    let [r, g, b] = rgb.get_pixel(x, y).0;
                    Rgba([r, g, b, alpha.get_pixel(x / sx, y / sy).0[3]])
                },
            ))
        } else {
            DynamicImage::ImageRgb32F(rgb)
        };
        Ok(convert_to(rendered, color))
    }

    /// Renders normalized `C x H x W` planes into a canvas.
    ///
    /// Planes are passed to the executor in the order given; no channel
    /// reordering happens here.
    ///
    /// # Errors
    ///
    /// - [`Error::Capture`] if `source` is empty
    /// - [`Error::Precondition`] if its channel count differs from the tiles
    /// - [`Error::Precondition`] or [`Error::Backend`] if any batch fails
    pub fn render_planes(&mut self, source: ArrayView3<'_, f32>) -> Result<Canvas> {
        // Planning
        let (channels, height, width) = source.dim();
        let input_size = Size::new(width, height);
        if input_size.is_empty() {
            return Err(Error::Capture(format!("image is {input_size}")));
        }
        if channels != self.config.tile.channels {
            return Err(Error::mismatch(
                "number of channels",
                self.config.tile.channels,
                channels,
            ));
        }

        let output_size = self.output_size(input_size);
        let plan = self.params.plan(output_size);
        let batch_size = self.config.batch_size;
        let schedule = Schedule::new(plan.len(), self.config.augmentation, batch_size);
        tracing::debug!(
            tiles = plan.len(),
            columns = plan.grid.width,
            rows = plan.grid.height,
            batches = schedule.batch_count(),
            output = %output_size,
            "planned render"
        );

        let mut queue = WorkQueue::with_capacity(batch_size);
        let mut batch = TileBatch::zeros(self.executor.input_shape());
        let tile_dims = self.executor.input_shape().tile_dims();
        let mut tile = Array3::<f32>::zeros(tile_dims);
        let mut compositor = Compositor::new(
            &self.masks,
            &plan,
            channels,
            output_size,
            self.config.augmentation,
        );

        // Streaming
        let mut batch_started = Instant::now();
        for step in 0..schedule.step_count() {
            let item = schedule.item(step);
            let slot = schedule.slot(step);
            queue.push(item);

            if item.is_padding(plan.len()) {
                batch.clear_slot(slot);
            } else if item.augmentation == AugmentationKind::Identity {
                let rect = plan.tiles[item.tile_index].input;
                padding::extract_into(source, rect, tile.view_mut())?;
                batch.slot_mut(slot).assign(&tile);
            } else {
                // same tile as the identity step that preceded it
                item.augmentation
                    .forward_into(tile.view(), batch.slot_mut(slot))?;
            }

            if slot + 1 < batch_size {
                continue;
            }

            let results = match infer_checked(&mut self.executor, batch.view()) {
                Ok(results) => results,
                Err(err) => {
                    tracing::error!(
                        "failed to infer tile {}/{}: {err}",
                        (item.tile_index + 1).min(plan.len()),
                        plan.len()
                    );
                    return Err(err);
                }
            };
            for (drained, result) in queue.drain_batch(batch_size).zip(results.outer_iter()) {
                compositor.consume(drained, result)?;
            }

            let elapsed = batch_started.elapsed().as_secs_f64();
            #[allow(clippy::cast_precision_loss)] // batch sizes are small
            let items_per_sec = if elapsed > 0.0 {
                batch_size as f64 / elapsed
            } else {
                f64::INFINITY
            };
            tracing::debug!(
                "rendered batch {}/{} ({items_per_sec:.2} it/s)",
                step / batch_size + 1,
                schedule.batch_count()
            );
            batch_started = Instant::now();
        }

        // Finalizing
        self.executor.synchronize()?;
        compositor.into_canvas()
    }
}

/// Checks the executor's batch shapes against the configuration.
fn check_executor_shapes(
    config: &RenderConfig,
    input: TensorShape,
    output: TensorShape,
) -> Result<()> {
    let expected = config.input_shape();
    if input != expected {
        return Err(Error::Configuration(format!(
            "executor takes {input} batches but the configuration asks for {expected}"
        )));
    }
    if output.batch != input.batch || output.channels != input.channels {
        return Err(Error::Configuration(format!(
            "executor maps {input} batches to {output}; batch size and channels must match"
        )));
    }

    let limit = config.scaling.apply(input.tile_size());
    let tile = output.tile_size();
    if tile.is_empty() || tile.width > limit.width || tile.height > limit.height {
        return Err(Error::Configuration(format!(
            "executor output tile {tile} does not fit the {limit} scaled input tile"
        )));
    }
    Ok(())
}
