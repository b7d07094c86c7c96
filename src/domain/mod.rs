// SPDX-License-Identifier: MPL-2.0
//! Domain layer - geometry, pixel buffers and augmentations.
//!
//! This module contains the value types every render stage shares. It
//! depends on `ndarray` for planar buffers and on nothing else outside `std`.
//!
//! # Modules
//!
//! - [`augmentation`]: Test-time augmentations ([`AugmentationKind`](augmentation::AugmentationKind),
//!   [`Primitive`](augmentation::Primitive))
//! - [`geometry`]: Pixel geometry ([`Size`](geometry::Size), [`TileRect`](geometry::TileRect),
//!   [`TileGeometry`](geometry::TileGeometry))
//! - [`tile`]: Owned buffers ([`TensorShape`](tile::TensorShape), [`TileBatch`](tile::TileBatch),
//!   [`Canvas`](tile::Canvas))

pub mod augmentation;
pub mod geometry;
pub mod tile;

pub use augmentation::{AugmentationKind, Primitive};
pub use geometry::{Size, TileGeometry, TileRect};
pub use tile::{Canvas, TensorShape, TileBatch};
