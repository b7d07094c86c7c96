// SPDX-License-Identifier: MPL-2.0
//! `tilestitch` runs fixed-size image-to-image models over images of any size.
//!
//! The model (an *executor*) only accepts batches of one exact tile shape.
//! This crate splits an image into overlapping tiles, streams them through
//! fixed-size batches, optionally averages eight geometric augmentations per
//! tile, and blends the results back into one seamless enlarged image.
//!
//! # Example
//!
//! ```
//! use tilestitch::config::{RenderConfig, TileDims};
//! use tilestitch::infrastructure::NearestExecutor;
//! use tilestitch::RenderSession;
//! use image_rs::RgbImage;
//!
//! let config = RenderConfig {
//!     tile: TileDims::new(3, 64, 64),
//!     ..RenderConfig::default()
//! };
//! let executor = NearestExecutor::new(config.input_shape(), 2);
//! let mut session = RenderSession::new(executor, config)?;
//! let output = session.render(&RgbImage::new(100, 70))?;
//! assert_eq!(output.dimensions(), (200, 140));
//! # Ok::<(), tilestitch::Error>(())
//! ```

#![doc(html_root_url = "https://docs.rs/tilestitch/0.1.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod media;

#[cfg(test)]
pub(crate) mod test_utils;

pub use application::port::TileExecutor;
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use media::pipeline::RenderSession;
