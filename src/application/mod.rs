// SPDX-License-Identifier: MPL-2.0
//! Application layer - ports the render engine depends on.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The render pipeline in [`media`](crate::media) talks to executors only
//!   through these ports

pub mod port;
