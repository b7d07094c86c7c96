// SPDX-License-Identifier: MPL-2.0
//! Tile scheduling, blending and compositing.
//!
//! Data flows one way through these modules:
//!
//! [`tiling`] plans the grid, [`padding`] cuts input tiles,
//! [`pipeline`] batches them through the executor using a [`work_queue`],
//! and [`compositor`] averages, [`blend`]s and accumulates the results.
//! [`conversion`] moves pixels between 8-bit images and planar buffers.

pub mod blend;
pub mod compositor;
pub mod conversion;
pub mod padding;
pub mod pipeline;
pub mod tiling;
pub mod work_queue;

// Re-export commonly used types
pub use blend::WeightMasks;
pub use pipeline::RenderSession;
pub use tiling::{TilePlan, TilingParams};
pub use work_queue::{WorkItem, WorkQueue};
