// SPDX-License-Identifier: MPL-2.0
//! Model file integrity checks using BLAKE3.

use std::path::Path;

use crate::error::{Error, Result};

/// Computes the BLAKE3 hash of a model file as lowercase hex.
///
/// # Errors
///
/// Returns an error if the model file is not found or cannot be read.
pub fn compute_model_hash(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::ModelNotFound(path.to_path_buf()));
    }

    let file_data = std::fs::read(path)?;
    Ok(blake3::hash(&file_data).to_hex().to_string())
}

/// Verifies a model file against an expected BLAKE3 hash.
///
/// # Errors
///
/// Returns an error if the model file is not found, cannot be read,
/// or the checksum does not match.
pub fn verify_checksum(path: &Path, expected_hash: &str) -> Result<()> {
    let actual_hash = compute_model_hash(path)?;
    if !actual_hash.eq_ignore_ascii_case(expected_hash) {
        return Err(Error::ChecksumMismatch {
            expected: expected_hash.to_string(),
            actual: actual_hash,
        });
    }
    Ok(())
}
