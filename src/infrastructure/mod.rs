// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the [`TileExecutor`]
//! port defined in `application::port`.
//!
//! # Available Adapters
//!
//! - [`onnx`]: Tile inference via ONNX Runtime
//! - [`reference`]: Nearest-neighbour enlargement in pure Rust
//!
//! [`TileExecutor`]: crate::application::port::TileExecutor

pub mod onnx;
pub mod reference;

// Re-export main types for convenience
pub use onnx::OnnxTileExecutor;
pub use reference::NearestExecutor;
