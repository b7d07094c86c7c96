// SPDX-License-Identifier: MPL-2.0
//! Deterministic pure-Rust executor.
//!
//! [`NearestExecutor`] enlarges every tile by nearest-neighbour sampling and
//! can trim a border from its output like real upscaling models do. It needs
//! no model file, which makes it useful for dry runs and benchmarks.

use ndarray::{Array4, ArrayView4};

use crate::application::port::TileExecutor;
use crate::domain::tile::TensorShape;
use crate::error::{Error, Result};

/// Nearest-neighbour tile executor.
#[derive(Debug, Clone)]
pub struct NearestExecutor {
    input: TensorShape,
    scale: usize,
    border: usize,
}

impl NearestExecutor {
    /// Creates an executor enlarging `input` batches by `scale`.
    #[must_use]
    pub const fn new(input: TensorShape, scale: usize) -> Self {
        Self {
            input,
            scale,
            border: 0,
        }
    }

    /// Trims `border` output pixels from every side of each tile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if nothing would be left of the tile.
    pub fn with_border(mut self, border: usize) -> Result<Self> {
        let height = self.input.height * self.scale;
        let width = self.input.width * self.scale;
        if 2 * border >= height.min(width) {
            return Err(Error::Configuration(format!(
                "border {border} leaves nothing of a {width}x{height} tile"
            )));
        }
        self.border = border;
        Ok(self)
    }

    #[must_use]
    pub const fn scale(&self) -> usize {
        self.scale
    }

    #[must_use]
    pub const fn border(&self) -> usize {
        self.border
    }
}

impl TileExecutor for NearestExecutor {
    fn name(&self) -> &str {
        "nearest"
    }

    fn input_shape(&self) -> TensorShape {
        self.input
    }

    fn output_shape(&self) -> TensorShape {
        TensorShape::new(
            self.input.batch,
            self.input.channels,
            self.input.height * self.scale - 2 * self.border,
            self.input.width * self.scale - 2 * self.border,
        )
    }

    fn infer(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        self.input.check(batch.shape())?;
        let (scale, border) = (self.scale, self.border);
        Ok(Array4::from_shape_fn(
            self.output_shape().dims(),
            |(n, c, y, x)| batch[[n, c, (y + border) / scale, (x + border) / scale]],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_pixel() {
        let mut executor = NearestExecutor::new(TensorShape::new(1, 1, 2, 2), 2);
        let batch = Array4::from_shape_vec((1, 1, 2, 2), vec![1.0, 2.0, 3.0, 4.0])
            .expect("valid shape");
        let output = executor.infer(batch.view()).expect("infer");

        assert_eq!(output.dim(), (1, 1, 4, 4));
        assert_eq!(output[[0, 0, 0, 1]], 1.0);
        assert_eq!(output[[0, 0, 1, 2]], 2.0);
        assert_eq!(output[[0, 0, 3, 0]], 3.0);
        assert_eq!(output[[0, 0, 3, 3]], 4.0);
    }

    #[test]
    fn border_trims_output() {
        let executor = NearestExecutor::new(TensorShape::new(2, 3, 8, 8), 2)
            .with_border(2)
            .expect("valid border");
        assert_eq!(executor.output_shape(), TensorShape::new(2, 3, 12, 12));
    }

    #[test]
    fn bordered_output_is_shifted() {
        let mut executor = NearestExecutor::new(TensorShape::new(1, 1, 4, 4), 2)
            .with_border(2)
            .expect("valid border");
        #[allow(clippy::cast_precision_loss)]
        let batch = Array4::from_shape_fn((1, 1, 4, 4), |(_, _, y, x)| (y * 4 + x) as f32);
        let output = executor.infer(batch.view()).expect("infer");
        // output (0, 0) is scaled pixel (2, 2), i.e. input (1, 1)
        assert_eq!(output[[0, 0, 0, 0]], 5.0);
    }

    #[test]
    fn oversized_border_is_rejected() {
        let result = NearestExecutor::new(TensorShape::new(1, 3, 4, 4), 2).with_border(4);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn wrong_batch_is_rejected() {
        let mut executor = NearestExecutor::new(TensorShape::new(2, 3, 4, 4), 2);
        let batch = Array4::<f32>::zeros((1, 3, 4, 4));
        assert!(executor.infer(batch.view()).is_err());
    }
}
