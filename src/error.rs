// SPDX-License-Identifier: MPL-2.0
//! Error types shared by every stage of a render.
//!
//! All failures are fatal to the current [`render`] call: nothing is
//! retried and a partially filled canvas is never handed back.
//!
//! [`render`]: crate::media::pipeline::RenderSession::render

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tilestitch library.
#[derive(Error, Debug)]
pub enum Error {
    /// The render configuration cannot produce a valid tiling, or the
    /// executor's tile shape does not agree with it.
    #[error("invalid render configuration: {0}")]
    Configuration(String),

    /// A tile or batch has the wrong shape for the operation it was handed to.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The executor itself failed or returned an unusable result.
    #[error("executor failed: {0}")]
    Backend(String),

    /// The source image is empty or unavailable.
    #[error("source image unavailable: {0}")]
    Capture(String),

    /// Model file not found at the expected path.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Model checksum verification failed.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// A configuration file exists but could not be parsed.
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Precondition`] describing an expected/actual mismatch.
    pub(crate) fn mismatch(
        what: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Error::Precondition(format!("invalid {what}: expected {expected}, got {actual}"))
    }
}

/// Result type alias for tilestitch operations.
pub type Result<T> = std::result::Result<T, Error>;
