// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines the abstract interface that executor adapters
//! implement. The trait uses only domain types, so the tiling engine stays
//! independent of any particular inference runtime.
//!
//! # Available Ports
//!
//! - [`executor`]: Fixed-shape tile transform ([`TileExecutor`])

pub mod executor;

pub use executor::{infer_checked, TileExecutor};
