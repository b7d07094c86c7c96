// SPDX-License-Identifier: MPL-2.0
//! Tile executor port definition.
//!
//! This module defines the [`TileExecutor`] trait: the narrow contract between
//! the tiling engine and the opaque model that transforms tiles.
//!
//! # Design Notes
//!
//! - An executor accepts exactly one batch shape and returns exactly one
//!   batch shape, both fixed when the executor is loaded
//! - Inputs are normalized to `[0, 1]`, planar `N x C x H x W`
//! - Executors may queue work asynchronously; [`TileExecutor::synchronize`]
//!   is the single barrier the engine waits on, at the end of a render
//! - Shape checks happen here, before the executor is called, so a bad batch
//!   is a local precondition failure rather than a backend error

use ndarray::{Array4, ArrayView4};

use crate::domain::tile::TensorShape;
use crate::error::{Error, Result};

// =============================================================================
// TileExecutor Trait
// =============================================================================

/// Port for a fixed-shape image-to-image transform.
///
/// Infrastructure adapters implement this trait using ONNX Runtime
/// ([`OnnxTileExecutor`]) or pure Rust ([`NearestExecutor`]).
///
/// [`OnnxTileExecutor`]: crate::infrastructure::onnx::OnnxTileExecutor
/// [`NearestExecutor`]: crate::infrastructure::reference::NearestExecutor
///
/// # Example
///
/// ```
/// use tilestitch::application::port::{infer_checked, TileExecutor};
/// use tilestitch::infrastructure::reference::NearestExecutor;
/// use tilestitch::domain::TensorShape;
/// use ndarray::Array4;
///
/// let mut executor = NearestExecutor::new(TensorShape::new(2, 3, 8, 8), 2);
/// let batch = Array4::<f32>::zeros((2, 3, 8, 8));
/// let output = infer_checked(&mut executor, batch.view()).unwrap();
/// assert_eq!(output.dim(), (2, 3, 16, 16));
/// ```
pub trait TileExecutor {
    /// Human-readable name used in log output.
    fn name(&self) -> &str;

    /// The only batch shape [`infer`](Self::infer) accepts.
    fn input_shape(&self) -> TensorShape;

    /// The batch shape [`infer`](Self::infer) returns.
    fn output_shape(&self) -> TensorShape;

    /// Transforms one full batch of tiles.
    ///
    /// Callers should go through [`infer_checked`], which validates shapes on
    /// both sides of the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if the transform fails.
    fn infer(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>>;

    /// Waits for all work queued by earlier [`infer`](Self::infer) calls.
    ///
    /// Executors that run synchronously keep the default no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] if queued work failed.
    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<E: TileExecutor + ?Sized> TileExecutor for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input_shape(&self) -> TensorShape {
        (**self).input_shape()
    }

    fn output_shape(&self) -> TensorShape {
        (**self).output_shape()
    }

    fn infer(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        (**self).infer(batch)
    }

    fn synchronize(&mut self) -> Result<()> {
        (**self).synchronize()
    }
}

/// Runs `executor` on `batch`, checking the batch against the executor's
/// input shape first and the result against its output shape after.
///
/// # Errors
///
/// - [`Error::Precondition`] if `batch` has the wrong batch size, channel
///   count, height or width; the executor is not called
/// - [`Error::Backend`] if the executor fails or returns a tensor of the
///   wrong shape
pub fn infer_checked<E: TileExecutor + ?Sized>(
    executor: &mut E,
    batch: ArrayView4<'_, f32>,
) -> Result<Array4<f32>> {
    executor.input_shape().check(batch.shape())?;

    let output = executor.infer(batch)?;

    let expected = executor.output_shape();
    if let Err(err) = expected.check(output.shape()) {
        return Err(Error::Backend(format!(
            "{} returned an unexpected tensor: {err}",
            executor.name()
        )));
    }
    Ok(output)
}
