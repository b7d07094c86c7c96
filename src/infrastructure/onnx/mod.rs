// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapter implementing the [`TileExecutor`] port trait.
//!
//! - [`OnnxTileExecutor`]: runs a fixed-shape image-to-image model
//! - [`verify_checksum`] / [`compute_model_hash`]: BLAKE3 integrity checks
//!   for model files
//!
//! # Design Notes
//!
//! - Model download, engine building and device selection are left to the
//!   caller; the adapter only loads a file that already exists
//! - The output tile shape is taken from a probe inference, so models that
//!   trim a border around each tile work without extra configuration
//!
//! [`TileExecutor`]: crate::application::port::TileExecutor

mod executor;
mod model;

pub use executor::OnnxTileExecutor;
pub use model::{compute_model_hash, verify_checksum};
